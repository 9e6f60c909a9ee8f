// Archivo: recovery.rs
// Propósito: recuperación de historias sin segmentos (generación inicial
// estancada). Sondea la persistencia en segundo plano y con ráfagas cuando
// el lector vuelve a la vista.
use crate::clock::Clock;
use crate::config::ContinuationConfig;
use crate::reader::Collaborators;
use story_domain::{StoryRepository, StorySegment};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

/// Cambios de visibilidad o foco de la vista de lectura.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Tarea de sondeo activa mientras la historia no tenga segmentos. Se
/// detiene sola al encontrarlos, con [`StallRecovery::stop`] o al soltarla.
pub struct StallRecovery {
    visibility: mpsc::UnboundedSender<Visibility>,
    segments: watch::Receiver<Vec<StorySegment>>,
    task: JoinHandle<()>,
}

struct Burst {
    next: Instant,
    until: Instant,
}

impl StallRecovery {
    /// Arranca el sondeo. Debe llamarse dentro de un runtime tokio.
    pub fn start(story_id: Uuid, collab: &Collaborators) -> Self {
        let (visibility, events) = mpsc::unbounded_channel();
        let (found, segments) = watch::channel(Vec::new());
        let task = tokio::spawn(run(story_id,
                                    collab.repo.clone(),
                                    collab.clock.clone(),
                                    collab.config.clone(),
                                    events,
                                    found));
        Self { visibility, segments, task }
    }

    pub fn notify(&self, event: Visibility) {
        if self.visibility.send(event).is_err() {
            log::debug!("recuperación ya terminada; se ignora {:?}", event);
        }
    }

    /// Espera a que aparezcan segmentos. `None` si el sondeo terminó sin
    /// encontrarlos.
    pub async fn wait_for_segments(&mut self) -> Option<Vec<StorySegment>> {
        loop {
            {
                let current = self.segments.borrow();
                if !current.is_empty() {
                    return Some(current.clone());
                }
            }
            if self.segments.changed().await.is_err() {
                let current = self.segments.borrow();
                return if current.is_empty() { None } else { Some(current.clone()) };
            }
        }
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for StallRecovery {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn poll(repo: &dyn StoryRepository, story_id: Uuid, found: &watch::Sender<Vec<StorySegment>>) -> bool {
    match repo.list_segments(&story_id) {
        Ok(segments) if !segments.is_empty() => {
            log::info!("historia {} recuperada con {} segmento(s)", story_id, segments.len());
            found.send_replace(segments);
            true
        }
        Ok(_) => {
            log::debug!("historia {} sigue sin segmentos", story_id);
            false
        }
        Err(e) => {
            log::warn!("sondeo de {} fallido: {}", story_id, e);
            false
        }
    }
}

async fn run(story_id: Uuid,
             repo: Arc<dyn StoryRepository>,
             clock: Arc<dyn Clock>,
             config: ContinuationConfig,
             mut events: mpsc::UnboundedReceiver<Visibility>,
             found: watch::Sender<Vec<StorySegment>>) {
    if poll(repo.as_ref(), story_id, &found) {
        return;
    }
    let mut next_background = clock.now() + config.recovery_background_interval;
    let mut burst: Option<Burst> = None;
    let mut listening = true;
    loop {
        let wake = match &burst {
            Some(b) => b.next.min(next_background),
            None => next_background,
        };
        let wait = wake.saturating_duration_since(clock.now());
        tokio::select! {
            event = events.recv(), if listening => match event {
                Some(Visibility::Visible) => {
                    if poll(repo.as_ref(), story_id, &found) {
                        return;
                    }
                    let now = clock.now();
                    burst = Some(Burst { next: now + config.recovery_burst_interval,
                                         until: now + config.recovery_burst_window });
                }
                Some(Visibility::Hidden) => burst = None,
                None => listening = false,
            },
            _ = clock.sleep(wait) => {
                let now = clock.now();
                let background_due = now >= next_background;
                let burst_due = burst.as_ref().is_some_and(|b| now >= b.next);
                if !(background_due || burst_due) {
                    continue;
                }
                if poll(repo.as_ref(), story_id, &found) {
                    return;
                }
                if background_due {
                    next_background = now + config.recovery_background_interval;
                }
                if burst_due {
                    burst = burst.and_then(|b| {
                                     let next = now + config.recovery_burst_interval;
                                     (next <= b.until).then_some(Burst { next, until: b.until })
                                 });
                }
            }
        }
    }
}
