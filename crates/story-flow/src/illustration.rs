// Archivo: illustration.rs
// Propósito: ilustraciones en segundo plano. La narración nunca espera a la
// imagen; el resultado se adjunta al segmento cuando llega.
use crate::backend::{GenerationBackend, ImageRequest};
use story_domain::{SegmentPatch, StoryRepository, StorySegment};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const ILLUSTRATION_PREFIX: &str = "Children's book illustration: ";

/// Prompt de ilustración: prefijo fijo + los primeros `max_chars`
/// caracteres del contenido.
pub fn illustration_prompt(content: &str, max_chars: usize) -> String {
    let excerpt: String = content.chars().take(max_chars).collect();
    format!("{}{}", ILLUSTRATION_PREFIX, excerpt.trim())
}

/// Lanza tareas de ilustración desacopladas.
#[derive(Clone)]
pub struct IllustrationDispatcher {
    backend: Arc<dyn GenerationBackend>,
    repo: Arc<dyn StoryRepository>,
    prompt_chars: usize,
}

impl IllustrationDispatcher {
    pub fn new(backend: Arc<dyn GenerationBackend>, repo: Arc<dyn StoryRepository>, prompt_chars: usize) -> Self {
        Self { backend, repo, prompt_chars }
    }

    /// Lanza la ilustración del segmento. Debe llamarse dentro de un runtime
    /// tokio. Los fallos se registran y no se propagan.
    pub fn dispatch(&self, segment: &StorySegment) -> IllustrationHandle {
        let segment_id = segment.id;
        let request = ImageRequest { segment_id,
                                     image_prompt: illustration_prompt(&segment.content, self.prompt_chars) };
        let backend = self.backend.clone();
        let repo = self.repo.clone();
        let handle = tokio::spawn(async move {
            let url = match backend.generate_image(request).await {
                Ok(url) => url,
                Err(e) => {
                    log::error!("ilustración fallida para el segmento {}: {}", segment_id, e);
                    return None;
                }
            };
            match repo.update_segment(&segment_id, SegmentPatch { image_url: Some(url.clone()) }) {
                Ok(_) => {
                    log::info!("ilustración adjuntada al segmento {}", segment_id);
                    Some(url)
                }
                Err(e) => {
                    log::error!("no se pudo guardar la ilustración del segmento {}: {}", segment_id, e);
                    None
                }
            }
        });
        IllustrationHandle { segment_id, handle }
    }
}

/// Resultado pendiente de una ilustración.
///
/// Puede esperarse con [`IllustrationHandle::wait`] o descartarse: soltar el
/// handle no cancela la tarea.
#[derive(Debug)]
pub struct IllustrationHandle {
    segment_id: Uuid,
    handle: JoinHandle<Option<String>>,
}

impl IllustrationHandle {
    pub fn segment_id(&self) -> Uuid {
        self.segment_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// URL adjuntada, o `None` si la ilustración falló.
    pub async fn wait(self) -> Option<String> {
        match self.handle.await {
            Ok(url) => url,
            Err(e) => {
                log::error!("tarea de ilustración {} interrumpida: {}", self.segment_id, e);
                None
            }
        }
    }
}
