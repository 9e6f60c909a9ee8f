use story_domain::CreationMode;
use thiserror::Error;

// Errores del pipeline de generación.
//
// Los fallos de validación NO son errores: se devuelven como datos dentro
// de `GenerationResult`. Este enum cubre el resto de condiciones
// inesperadas que el llamador debe tratar.
#[derive(Error, Debug)]
pub enum GenerationError {
  /// No hay estrategia registrada para el modo pedido.
  #[error("No hay estrategia para el modo: {0}")]
  NoStrategy(CreationMode),

  /// El contexto pide un modo distinto al de la estrategia que lo procesa.
  #[error("La estrategia {expected} no puede procesar un contexto {actual}")]
  ModeMismatch { expected: CreationMode, actual: CreationMode },

  /// La plantilla seleccionada no trae `settings`.
  #[error("La plantilla '{0}' no tiene configuración de escenario")]
  MissingTemplateSettings(String),

  /// Errores de serialización/deserialización JSON.
  #[error("Error de serialización: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("Otro error: {0}")]
  Other(String),
}
