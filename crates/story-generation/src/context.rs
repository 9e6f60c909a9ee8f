use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use story_domain::{CreationMode, NewStory};

/// Contexto de una petición de generación.
///
/// Se construye justo antes de llamar a `generate_story` y se descarta al
/// terminar; no se persiste. Los campos son inmutables tras la
/// construcción.
#[derive(Debug, Clone)]
pub struct GenerationContext {
  mode: CreationMode,
  user_id: String,
  raw_data: JsonValue,
  metadata: ContextMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextMetadata {
  pub created_at: DateTime<Utc>,
}

impl GenerationContext {
  pub fn new(mode: CreationMode, user_id: impl Into<String>, raw_data: JsonValue) -> Self {
    Self { mode, user_id: user_id.into(), raw_data, metadata: ContextMetadata { created_at: Utc::now() } }
  }

  pub fn mode(&self) -> CreationMode {
    self.mode
  }

  pub fn user_id(&self) -> &str {
    &self.user_id
  }

  /// Entrada sin validar; su forma depende del modo.
  pub fn raw_data(&self) -> &JsonValue {
    &self.raw_data
  }

  pub fn created_at(&self) -> DateTime<Utc> {
    self.metadata.created_at
  }
}

/// Resultado de la fase de validación.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
  pub is_valid: bool,
  /// Errores bloqueantes (campos requeridos).
  pub errors: Vec<String>,
  /// Avisos no bloqueantes.
  pub warnings: Vec<String>,
}

impl ValidationOutcome {
  /// Válido si y sólo si no hay errores.
  pub fn from_checks(errors: Vec<String>, warnings: Vec<String>) -> Self {
    Self { is_valid: errors.is_empty(), errors, warnings }
  }

  pub fn invalid(message: impl Into<String>) -> Self {
    Self::from_checks(vec![message.into()], Vec::new())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultMetadata {
  pub mode: CreationMode,
  /// `now - context.created_at`, en milisegundos.
  pub processing_time_ms: i64,
}

/// Salida de una ejecución del pipeline.
///
/// Si `validation_errors` no está vacío, `story` es el marcador vacío y las
/// fases 2..6 no se ejecutaron.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
  pub story: NewStory,
  pub validation_errors: Option<Vec<String>>,
  pub warnings: Vec<String>,
  pub metadata: ResultMetadata,
}

impl GenerationResult {
  pub fn invalid(ctx: &GenerationContext, errors: Vec<String>, warnings: Vec<String>) -> Self {
    Self { story: NewStory::default(),
           validation_errors: Some(errors),
           warnings,
           metadata: ResultMetadata::finish(ctx) }
  }

  pub fn success(ctx: &GenerationContext, story: NewStory, warnings: Vec<String>) -> Self {
    Self { story, validation_errors: None, warnings, metadata: ResultMetadata::finish(ctx) }
  }

  pub fn is_valid(&self) -> bool {
    self.validation_errors.as_ref().map_or(true, |e| e.is_empty())
  }
}

impl ResultMetadata {
  fn finish(ctx: &GenerationContext) -> Self {
    let elapsed = Utc::now() - ctx.created_at();
    Self { mode: ctx.mode(), processing_time_ms: elapsed.num_milliseconds().max(0) }
  }
}
