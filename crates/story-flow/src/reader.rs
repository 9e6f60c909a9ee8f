// Archivo: reader.rs
// Propósito: sesión de lectura de una historia. Resuelve opciones, pide
// segmentos al backend, los persiste y sólo avanza el puntero cuando una
// recarga confirma el segmento nuevo.
use crate::backend::{AudioRequest, AudioResult, EndingRequest, GeneratedSegment, GenerationBackend, SegmentRequest};
use crate::choice::resolve_choice_index;
use crate::clock::Clock;
use crate::config::ContinuationConfig;
use crate::errors::{FlowError, Result};
use crate::illustration::{illustration_prompt, IllustrationDispatcher, IllustrationHandle};
use story_domain::{NewSegment, Story, StoryRepository, StorySegment, CHOICES_PER_SEGMENT};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Dependencias compartidas por lectores y servicio.
#[derive(Clone)]
pub struct Collaborators {
    pub repo: Arc<dyn StoryRepository>,
    pub backend: Arc<dyn GenerationBackend>,
    pub clock: Arc<dyn Clock>,
    pub config: ContinuationConfig,
}

impl Collaborators {
    pub fn new(repo: Arc<dyn StoryRepository>,
               backend: Arc<dyn GenerationBackend>,
               clock: Arc<dyn Clock>,
               config: ContinuationConfig)
               -> Self {
        Self { repo, backend, clock, config }
    }

    pub fn illustrations(&self) -> IllustrationDispatcher {
        IllustrationDispatcher::new(self.backend.clone(), self.repo.clone(), self.config.illustration_prompt_chars)
    }
}

/// Valida la respuesta del generador y la persiste en `position`.
///
/// Un segmento que no es final debe traer exactamente
/// `CHOICES_PER_SEGMENT` opciones; un final se guarda sin opciones.
pub(crate) fn persist_generated_segment(collab: &Collaborators,
                                        story_id: Uuid,
                                        generated: GeneratedSegment,
                                        position: u32,
                                        force_end: bool)
                                        -> Result<StorySegment> {
    let GeneratedSegment { content, choices, image_prompt, is_end } = generated;
    let is_end = force_end || is_end;
    if content.trim().is_empty() {
        return Err(FlowError::InvalidSegment("el contenido llegó vacío".to_string()));
    }
    if !is_end && choices.len() != CHOICES_PER_SEGMENT {
        return Err(FlowError::InvalidSegment(format!("se esperaban {} opciones y llegaron {}",
                                                     CHOICES_PER_SEGMENT,
                                                     choices.len())));
    }
    let image_prompt = image_prompt.filter(|p| !p.trim().is_empty())
                                   .unwrap_or_else(|| illustration_prompt(&content, collab.config.illustration_prompt_chars));
    let segment = collab.repo.create_segment(NewSegment { story_id,
                                                          content,
                                                          position,
                                                          choices: if is_end { Vec::new() } else { choices },
                                                          image_prompt: Some(image_prompt),
                                                          is_end })?;
    log::info!("segmento {} guardado en la posición {} (final: {})", segment.id, position, is_end);
    Ok(segment)
}

/// Estado de la sesión de lectura.
///
/// `AwaitingChoice` y `SegmentReady` aceptan la siguiente opción; el
/// segundo sólo indica que el segmento visible acaba de confirmarse tras una
/// continuación. Ver [`StoryReader::accepts_choice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderState {
    /// Recién abierto sobre un segmento con opciones.
    AwaitingChoice,
    Generating,
    /// Continuación confirmada; espera la siguiente opción.
    SegmentReady,
    EndingReady,
    /// Última petición fallida; se admite reintentar.
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum ReaderEvent {
    /// Se emite una única vez, `ending_transition_delay` después de mostrar
    /// el segmento final.
    StoryComplete { story: Story, final_segment: StorySegment },
}

/// Resultado de una continuación: el segmento confirmado y su ilustración
/// pendiente.
#[derive(Debug)]
pub struct ContinuationOutcome {
    pub segment: StorySegment,
    pub illustration: IllustrationHandle,
}

// Segmento ya persistido cuya confirmación agotó el tiempo de recarga.
struct PendingSegment {
    segment: StorySegment,
    illustration: IllustrationHandle,
}

pub struct StoryReader {
    story: Story,
    collab: Collaborators,
    illustrations: IllustrationDispatcher,
    segments: Vec<StorySegment>,
    current: usize,
    state: ReaderState,
    events_tx: mpsc::UnboundedSender<ReaderEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<ReaderEvent>>,
    completion_timer: Option<JoinHandle<()>>,
    pending: Option<PendingSegment>,
    closed: bool,
}

impl StoryReader {
    /// Abre la historia y sitúa el puntero en su último segmento.
    pub async fn open(story_id: Uuid, collab: Collaborators) -> Result<Self> {
        let story = collab.repo
                          .get_story(&story_id)?
                          .ok_or_else(|| FlowError::NotFound(format!("historia {}", story_id)))?;
        let segments = collab.repo.list_segments(&story_id)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut reader = Self { illustrations: collab.illustrations(),
                                current: segments.len().saturating_sub(1),
                                story,
                                collab,
                                segments,
                                state: ReaderState::AwaitingChoice,
                                events_tx,
                                events_rx: Some(events_rx),
                                completion_timer: None,
                                pending: None,
                                closed: false };
        reader.detect_ending();
        log::debug!("lector abierto para {} con {} segmentos", story_id, reader.segments.len());
        Ok(reader)
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn segments(&self) -> &[StorySegment] {
        &self.segments
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_segment(&self) -> Option<&StorySegment> {
        self.segments.get(self.current)
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    /// Receptor de eventos del lector. Sólo puede tomarse una vez.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ReaderEvent>> {
        self.events_rx.take()
    }

    /// `true` si la próxima `select_choice` puede llegar al backend: el
    /// puntero está en el último segmento, que no es final, y no hay
    /// petición en curso.
    pub fn accepts_choice(&self) -> bool {
        let on_latest = self.segments.last().is_some_and(|s| !s.is_end) && self.current + 1 == self.segments.len();
        on_latest && matches!(self.state, ReaderState::AwaitingChoice | ReaderState::SegmentReady | ReaderState::Failed(_))
    }

    /// Hay un segmento persistido pendiente de confirmar.
    pub fn has_pending_segment(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_completion_scheduled(&self) -> bool {
        self.completion_timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Recarga la lista de segmentos desde la persistencia.
    pub fn refresh(&mut self) -> Result<usize> {
        self.segments = self.collab.repo.list_segments(&self.story.id)?;
        if self.current >= self.segments.len() {
            self.current = self.segments.len().saturating_sub(1);
        }
        let pending_id = self.pending.as_ref().map(|p| p.segment.id);
        if let Some(index) = pending_id.and_then(|id| self.segments.iter().position(|s| s.id == id)) {
            log::info!("segmento pendiente {} visible tras recargar", self.segments[index].id);
            self.pending = None;
            self.current = index;
            self.state = ReaderState::SegmentReady;
        }
        self.detect_ending();
        Ok(self.segments.len())
    }

    /// Mueve el puntero a un segmento ya cargado (relectura).
    pub fn go_to(&mut self, index: usize) -> Result<&StorySegment> {
        if index >= self.segments.len() {
            return Err(FlowError::NotFound(format!("segmento {} de la historia {}", index, self.story.id)));
        }
        self.current = index;
        self.detect_ending();
        Ok(&self.segments[index])
    }

    /// Continúa la historia con la opción indicada (id de objeto, texto
    /// exacto o `choice-N`).
    ///
    /// Si una continuación anterior quedó persistida sin confirmar, se
    /// reanuda su confirmación en lugar de generar otro segmento.
    pub async fn select_choice(&mut self, choice_id: &str) -> Result<ContinuationOutcome> {
        if let Some(resumed) = self.resume_pending().await {
            return resumed;
        }
        let segment = self.choosable_segment()?;
        let index = match resolve_choice_index(choice_id, &segment.choices) {
            Ok(index) => index,
            Err(e) => return Err(self.fail(e)),
        };
        log::info!("historia {}: opción '{}' -> índice {}", self.story.id, choice_id, index);
        self.state = ReaderState::Generating;
        let request = SegmentRequest { story_id: self.story.id,
                                       choice_index: Some(index),
                                       choice_text: segment.choices.get(index).map(|c| c.text().to_string()),
                                       story: self.story.clone(),
                                       previous_segments: self.segments.clone() };
        let generated = match self.collab.backend.generate_segment(request).await {
            Ok(generated) => generated,
            Err(e) => return Err(self.fail(e)),
        };
        self.commit(generated, false).await
    }

    /// Pide un final para la historia.
    pub async fn end_story(&mut self) -> Result<ContinuationOutcome> {
        if let Some(resumed) = self.resume_pending().await {
            return resumed;
        }
        let last = self.segments.last().ok_or(FlowError::EmptyStory(self.story.id))?;
        if last.is_end {
            return Err(FlowError::StoryEnded(self.story.id));
        }
        self.state = ReaderState::Generating;
        let request = EndingRequest { story_id: self.story.id,
                                      story: self.story.clone(),
                                      previous_segments: self.segments.clone() };
        let generated = match self.collab.backend.generate_ending(request).await {
            Ok(generated) => generated,
            Err(e) => return Err(self.fail(e)),
        };
        self.commit(generated, true).await
    }

    /// Narración en audio. Un fallo no altera el estado del lector.
    pub async fn request_audio(&self) -> Result<AudioResult> {
        self.collab
            .backend
            .generate_audio(AudioRequest { story_id: self.story.id })
            .await
            .map_err(|e| {
                log::error!("audio fallido para la historia {}: {}", self.story.id, e);
                e
            })
    }

    /// Cancela el evento de finalización pendiente. Un lector cerrado no
    /// vuelve a programarlo.
    pub fn close(&mut self) {
        self.closed = true;
        if let Some(timer) = self.completion_timer.take() {
            timer.abort();
            log::debug!("lector de {} cerrado", self.story.id);
        }
    }

    fn choosable_segment(&self) -> Result<StorySegment> {
        let last = self.segments.last().ok_or(FlowError::EmptyStory(self.story.id))?;
        if last.is_end {
            return Err(FlowError::ChoiceResolution(format!("la historia {} ya terminó y no ofrece opciones",
                                                           self.story.id)));
        }
        if self.current + 1 != self.segments.len() {
            return Err(FlowError::ChoiceResolution("sólo se puede elegir en el último segmento".to_string()));
        }
        Ok(last.clone())
    }

    async fn commit(&mut self, generated: GeneratedSegment, force_end: bool) -> Result<ContinuationOutcome> {
        let position = self.segments.last().map_or(1, |s| s.position + 1);
        let stored = match persist_generated_segment(&self.collab, self.story.id, generated, position, force_end) {
            Ok(stored) => stored,
            Err(e) => return Err(self.fail(e)),
        };
        let illustration = self.illustrations.dispatch(&stored);
        self.confirm(stored, illustration).await
    }

    async fn resume_pending(&mut self) -> Option<Result<ContinuationOutcome>> {
        let pending = self.pending.take()?;
        log::info!("historia {}: reanudando la confirmación de {}", self.story.id, pending.segment.id);
        self.state = ReaderState::Generating;
        Some(self.confirm(pending.segment, pending.illustration).await)
    }

    async fn confirm(&mut self, stored: StorySegment, illustration: IllustrationHandle) -> Result<ContinuationOutcome> {
        let index = match self.await_confirmation(&stored).await {
            Ok(index) => index,
            Err(e) => {
                if matches!(e, FlowError::RefetchTimeout(_)) {
                    self.pending = Some(PendingSegment { segment: stored, illustration });
                }
                return Err(self.fail(e));
            }
        };
        self.current = index;
        self.state = if stored.is_end { ReaderState::EndingReady } else { ReaderState::SegmentReady };
        self.detect_ending();
        Ok(ContinuationOutcome { segment: stored, illustration })
    }

    // Recarga hasta ver el segmento persistido; la lista local sólo se
    // reemplaza con lo que devuelve la persistencia.
    async fn await_confirmation(&mut self, expected: &StorySegment) -> Result<usize> {
        let deadline = self.collab.clock.now() + self.collab.config.refetch_timeout;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let fetched = self.collab.repo.list_segments(&self.story.id)?;
            if let Some(index) = fetched.iter().position(|s| s.id == expected.id) {
                log::debug!("segmento {} confirmado tras {} recarga(s)", expected.id, attempts);
                self.segments = fetched;
                return Ok(index);
            }
            if self.collab.clock.now() >= deadline {
                log::warn!("el segmento {} no apareció tras {} recargas", expected.id, attempts);
                return Err(FlowError::RefetchTimeout(expected.id));
            }
            log::debug!("segmento {} aún no visible; reintento {}", expected.id, attempts);
            self.collab.clock.sleep(self.collab.config.refetch_interval).await;
        }
    }

    fn fail(&mut self, error: FlowError) -> FlowError {
        log::error!("historia {}: {}", self.story.id, error);
        self.state = ReaderState::Failed(error.to_string());
        error
    }

    fn detect_ending(&mut self) {
        let Some(segment) = self.segments.get(self.current) else { return };
        if !segment.is_end {
            return;
        }
        self.state = ReaderState::EndingReady;
        if self.closed || self.completion_timer.is_some() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("sin runtime tokio; no se programa el fin de la historia {}", self.story.id);
            return;
        };
        let event = ReaderEvent::StoryComplete { story: self.story.clone(), final_segment: segment.clone() };
        let tx = self.events_tx.clone();
        let clock = self.collab.clock.clone();
        let delay = self.collab.config.ending_transition_delay;
        self.completion_timer = Some(runtime.spawn(async move {
                                                 clock.sleep(delay).await;
                                                 if tx.send(event).is_err() {
                                                     log::debug!("evento de fin sin receptor");
                                                 }
                                             }));
    }
}

impl Drop for StoryReader {
    fn drop(&mut self) {
        self.close();
    }
}
