use crate::context::{GenerationContext, GenerationResult, ValidationOutcome};
use crate::errors::GenerationError;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use story_domain::{CreationMode, NewStory};

/// Pipeline de seis fases que implementa cada modo de creación.
///
/// Las fases se ejecutan siempre en el mismo orden desde `generate_story`:
/// validar -> transformar -> completar defaults -> lógica del modo ->
/// prompt -> objeto historia. Ninguna fase hace I/O; la única fuente de
/// aleatoriedad es el `rng` que recibe `build_story_object`.
pub trait StoryStrategy: Send + Sync {
  /// Forma de la entrada sin validar (se deserializa desde `raw_data`).
  type Input: DeserializeOwned;
  /// Datos normalizados que circulan entre las fases 2..6.
  type Data;

  /// Modo que atiende la estrategia.
  const MODE: CreationMode;

  /// Fase 1: comprobación de campos requeridos.
  fn validate_input(&self, input: &Self::Input) -> ValidationOutcome;

  /// Fase 2: recorta textos, quita rasgos vacíos y calcula el número de
  /// palabras por capítulo.
  fn transform_data(&self, input: Self::Input) -> Result<Self::Data, GenerationError>;

  /// Fase 3: completa valores por defecto sin sobrescribir campos con
  /// contenido.
  fn enrich_with_defaults(&self, data: Self::Data) -> Result<Self::Data, GenerationError>;

  /// Fase 4: enriquecimiento propio del modo.
  fn apply_mode_specific_logic(&self, data: Self::Data, ctx: &GenerationContext) -> Result<Self::Data, GenerationError>;

  /// Fase 5: instrucciones en lenguaje natural para el generador de texto.
  fn generate_prompt(&self, data: &Self::Data) -> String;

  /// Fase 6: registro parcial de la historia listo para persistir.
  fn build_story_object(&self,
                        data: &Self::Data,
                        prompt: String,
                        ctx: &GenerationContext,
                        rng: &mut dyn RngCore)
                        -> NewStory;

  /// Deserializa la entrada. Un JSON con forma incorrecta se trata como
  /// fallo de validación, no como error.
  fn parse_input(&self, raw: &JsonValue) -> Result<Self::Input, String> {
    let raw = if raw.is_null() { JsonValue::Object(Default::default()) } else { raw.clone() };
    serde_json::from_value(raw).map_err(|e| format!("Invalid input: {}", e))
  }

  /// Ejecuta las seis fases. Si la validación falla devuelve la historia
  /// vacía con los errores y no llama a ninguna fase posterior.
  fn generate_story(&self, ctx: &GenerationContext, rng: &mut dyn RngCore) -> Result<GenerationResult, GenerationError> {
    if ctx.mode() != Self::MODE {
      return Err(GenerationError::ModeMismatch { expected: Self::MODE, actual: ctx.mode() });
    }

    let input = match self.parse_input(ctx.raw_data()) {
      Ok(input) => input,
      Err(message) => {
        log::warn!("entrada inválida para el modo {}: {}", Self::MODE, message);
        return Ok(GenerationResult::invalid(ctx, vec![message], Vec::new()));
      }
    };

    let validation = self.validate_input(&input);
    if !validation.is_valid {
      log::warn!("validación fallida en modo {}: {:?}", Self::MODE, validation.errors);
      return Ok(GenerationResult::invalid(ctx, validation.errors, validation.warnings));
    }

    let data = self.transform_data(input)?;
    let data = self.enrich_with_defaults(data)?;
    let data = self.apply_mode_specific_logic(data, ctx)?;
    let prompt = self.generate_prompt(&data);
    let mut story = self.build_story_object(&data, prompt, ctx, rng);
    story.creation_mode = Some(Self::MODE);
    story.user_id = Some(ctx.user_id().to_string());

    let result = GenerationResult::success(ctx, story, validation.warnings);
    log::debug!("pipeline {} completado en {} ms", Self::MODE, result.metadata.processing_time_ms);
    Ok(result)
  }
}

/// Vista object-safe del pipeline, usada por la fábrica.
pub trait GenerationStrategy: Send + Sync {
  fn mode(&self) -> CreationMode;

  fn generate(&self, ctx: &GenerationContext, rng: &mut dyn RngCore) -> Result<GenerationResult, GenerationError>;
}

impl<S> GenerationStrategy for S where S: StoryStrategy
{
  fn mode(&self) -> CreationMode {
    S::MODE
  }

  fn generate(&self, ctx: &GenerationContext, rng: &mut dyn RngCore) -> Result<GenerationResult, GenerationError> {
    self.generate_story(ctx, rng)
  }
}
