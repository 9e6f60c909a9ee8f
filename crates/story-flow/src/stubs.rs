// Archivo: stubs.rs
// Propósito: backend de generación guionizado para tests y para la CLI.
use crate::backend::{AudioRequest, AudioResult, EndingRequest, GeneratedSegment, GenerationBackend, ImageRequest, SegmentRequest};
use crate::errors::{FlowError, Result};
use async_trait::async_trait;
use story_domain::{SegmentChoice, Story, CHOICES_PER_SEGMENT};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const CHOICE_TEXTS: [&str; 4] =
    ["Follow the glowing path", "Ask a friend for help", "Hide and watch quietly", "Try something brave"];

/// Backend determinista: contenido derivado de la historia, opciones
/// `choice-0..N`, fallos activables y contadores de llamadas.
pub struct ScriptedBackend {
    end_after: Option<usize>,
    image_delay: Duration,
    choices_per_segment: AtomicUsize,
    fail_segments: AtomicBool,
    fail_images: AtomicBool,
    fail_audio: AtomicBool,
    segment_calls: AtomicUsize,
    ending_calls: AtomicUsize,
    image_calls: AtomicUsize,
    audio_calls: AtomicUsize,
    requested_choices: Mutex<Vec<Option<usize>>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self { end_after: None,
               image_delay: Duration::ZERO,
               choices_per_segment: AtomicUsize::new(CHOICES_PER_SEGMENT),
               fail_segments: AtomicBool::new(false),
               fail_images: AtomicBool::new(false),
               fail_audio: AtomicBool::new(false),
               segment_calls: AtomicUsize::new(0),
               ending_calls: AtomicUsize::new(0),
               image_calls: AtomicUsize::new(0),
               audio_calls: AtomicUsize::new(0),
               requested_choices: Mutex::new(Vec::new()) }
    }

    /// El segmento número `segments` (1-based) se devuelve como final.
    pub fn ending_after(mut self, segments: usize) -> Self {
        self.end_after = Some(segments);
        self
    }

    pub fn with_image_delay(mut self, delay: Duration) -> Self {
        self.image_delay = delay;
        self
    }

    pub fn set_choices_per_segment(&self, count: usize) {
        self.choices_per_segment.store(count, Ordering::SeqCst);
    }

    pub fn set_fail_segments(&self, fail: bool) {
        self.fail_segments.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_images(&self, fail: bool) {
        self.fail_images.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_audio(&self, fail: bool) {
        self.fail_audio.store(fail, Ordering::SeqCst);
    }

    pub fn segment_calls(&self) -> usize {
        self.segment_calls.load(Ordering::SeqCst)
    }

    pub fn ending_calls(&self) -> usize {
        self.ending_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn audio_calls(&self) -> usize {
        self.audio_calls.load(Ordering::SeqCst)
    }

    /// `choice_index` de cada petición de segmento, en orden.
    pub fn requested_choices(&self) -> Vec<Option<usize>> {
        self.requested_choices.lock().map(|h| h.clone()).unwrap_or_default()
    }

    fn choices(&self) -> Vec<SegmentChoice> {
        let count = self.choices_per_segment.load(Ordering::SeqCst);
        CHOICE_TEXTS.iter()
                    .cycle()
                    .take(count)
                    .enumerate()
                    .map(|(i, text)| SegmentChoice::object(format!("choice-{}", i), *text))
                    .collect()
    }
}

fn ending_text(story: &Story) -> String {
    match &story.moral_lesson {
        Some(moral) => format!("And so \"{}\" came to a gentle end. {}.", story.title, moral),
        None => format!("And so \"{}\" came to a gentle end.", story.title),
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate_segment(&self, request: SegmentRequest) -> Result<GeneratedSegment> {
        self.segment_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut history) = self.requested_choices.lock() {
            history.push(request.choice_index);
        }
        if self.fail_segments.load(Ordering::SeqCst) {
            return Err(FlowError::GenerationRequest("scripted segment failure".to_string()));
        }
        let chapter = request.previous_segments.len() + 1;
        let story = &request.story;
        if self.end_after.is_some_and(|n| chapter >= n) {
            return Ok(GeneratedSegment { content: ending_text(story), choices: Vec::new(), image_prompt: None, is_end: true });
        }
        let content = match request.choice_text {
            Some(choice) => format!("Chapter {} of \"{}\". After choosing to {}, the journey through {} continued.",
                                    chapter,
                                    story.title,
                                    choice.to_lowercase(),
                                    story.setting),
            None => format!("Chapter 1 of \"{}\". It all began in {}, where a story about {} was waiting.",
                            story.title,
                            story.setting,
                            story.theme.to_lowercase()),
        };
        Ok(GeneratedSegment { content, choices: self.choices(), image_prompt: None, is_end: false })
    }

    async fn generate_ending(&self, request: EndingRequest) -> Result<GeneratedSegment> {
        self.ending_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_segments.load(Ordering::SeqCst) {
            return Err(FlowError::GenerationRequest("scripted ending failure".to_string()));
        }
        Ok(GeneratedSegment { content: ending_text(&request.story), choices: Vec::new(), image_prompt: None, is_end: true })
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<String> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if !self.image_delay.is_zero() {
            tokio::time::sleep(self.image_delay).await;
        }
        if self.fail_images.load(Ordering::SeqCst) {
            return Err(FlowError::Illustration(format!("scripted image failure for {}", request.segment_id)));
        }
        Ok(format!("https://images.local/{}.png", request.segment_id))
    }

    async fn generate_audio(&self, request: AudioRequest) -> Result<AudioResult> {
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_audio.load(Ordering::SeqCst) {
            return Err(FlowError::GenerationRequest("scripted audio failure".to_string()));
        }
        Ok(AudioResult { audio_url: format!("https://audio.local/{}.mp3", request.story_id) })
    }
}
