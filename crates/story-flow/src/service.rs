// Archivo: service.rs
// Propósito: fachada de alto nivel. Ejecuta el pipeline de generación,
// persiste la historia, pide el primer segmento y abre lectores.
use crate::backend::SegmentRequest;
use crate::errors::{FlowError, Result};
use crate::illustration::IllustrationHandle;
use crate::reader::{persist_generated_segment, Collaborators, StoryReader};
use crate::recovery::StallRecovery;
use rand::rngs::StdRng;
use rand::SeedableRng;
use story_domain::{CreationMode, Story, StorySegment};
use story_generation::{GenerationContext, StrategyFactory};
use std::sync::Mutex;
use uuid::Uuid;

/// Resultado de `StoryService::create_story`.
#[derive(Debug)]
pub enum CreationOutcome {
    /// La entrada no superó la validación; no se persistió nada.
    Invalid { errors: Vec<String>, warnings: Vec<String> },
    Created {
        story: Story,
        first_segment: StorySegment,
        warnings: Vec<String>,
        illustration: IllustrationHandle,
    },
}

pub struct StoryService {
    factory: StrategyFactory,
    collab: Collaborators,
    rng: Mutex<StdRng>,
}

impl StoryService {
    pub fn new(factory: StrategyFactory, collab: Collaborators) -> Self {
        Self { factory, collab, rng: Mutex::new(StdRng::from_entropy()) }
    }

    /// Fija la semilla usada para elegir títulos (reproducibilidad).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn supported_modes(&self) -> Vec<CreationMode> {
        self.factory.supported_modes()
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collab
    }

    /// Crea una historia completa: pipeline, cabecera, primer segmento e
    /// ilustración en segundo plano.
    ///
    /// Si el primer segmento falla, la historia queda persistida sin
    /// segmentos y puede recuperarse con [`StoryService::stall_recovery`].
    pub async fn create_story(&self, ctx: &GenerationContext) -> Result<CreationOutcome> {
        let result = {
            let mut rng = self.rng
                              .lock()
                              .map_err(|e| FlowError::Storage(format!("Mutex 'rng' poisoned: {}", e)))?;
            self.factory.generate(ctx, &mut *rng)?
        };
        if !result.is_valid() {
            let errors = result.validation_errors.unwrap_or_default();
            log::warn!("creación rechazada ({}): {}", ctx.mode(), errors.join("; "));
            return Ok(CreationOutcome::Invalid { errors, warnings: result.warnings });
        }

        let story = self.collab.repo.create_story(result.story)?;
        let request = SegmentRequest { story_id: story.id,
                                       choice_index: None,
                                       choice_text: None,
                                       story: story.clone(),
                                       previous_segments: Vec::new() };
        let generated = match self.collab.backend.generate_segment(request).await {
            Ok(generated) => generated,
            Err(e) => {
                log::error!("primer segmento de {} fallido: {}", story.id, e);
                return Err(e);
            }
        };
        let first_segment = persist_generated_segment(&self.collab, story.id, generated, 1, false)?;
        let illustration = self.collab.illustrations().dispatch(&first_segment);
        Ok(CreationOutcome::Created { story, first_segment, warnings: result.warnings, illustration })
    }

    pub async fn open_reader(&self, story_id: Uuid) -> Result<StoryReader> {
        StoryReader::open(story_id, self.collab.clone()).await
    }

    pub fn list_stories(&self, user_id: &str) -> Result<Vec<Story>> {
        Ok(self.collab.repo.list_stories(user_id)?)
    }

    pub fn stall_recovery(&self, story_id: Uuid) -> StallRecovery {
        StallRecovery::start(story_id, &self.collab)
    }
}
