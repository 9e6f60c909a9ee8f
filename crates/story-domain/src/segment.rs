// segment.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Número de opciones que lleva todo segmento que no es final.
pub const CHOICES_PER_SEGMENT: usize = 3;

/// Opción ofrecida al lector. Los registros existentes guardan tanto
/// textos planos como objetos `{id, text}`; ambas formas se aceptan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SegmentChoice {
  Text(String),
  Object { id: String, text: String },
}

impl SegmentChoice {
  pub fn object(id: impl Into<String>, text: impl Into<String>) -> Self {
    SegmentChoice::Object { id: id.into(), text: text.into() }
  }

  pub fn text(&self) -> &str {
    match self {
      SegmentChoice::Text(t) => t,
      SegmentChoice::Object { text, .. } => text,
    }
  }

  /// Id explícito, sólo para la forma objeto.
  pub fn id(&self) -> Option<&str> {
    match self {
      SegmentChoice::Text(_) => None,
      SegmentChoice::Object { id, .. } => Some(id),
    }
  }
}

/// Unidad de narración persistida.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySegment {
  pub id: Uuid,
  pub story_id: Uuid,
  pub content: String,
  /// Posición 1-based, contigua dentro de la historia.
  pub position: u32,
  pub choices: Vec<SegmentChoice>,
  pub image_prompt: Option<String>,
  /// Se completa cuando termina la ilustración asíncrona.
  pub image_url: Option<String>,
  pub is_end: bool,
  pub created_at: DateTime<Utc>,
}

/// Datos para insertar un segmento. El repositorio genera `id` y
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSegment {
  pub story_id: Uuid,
  pub content: String,
  pub position: u32,
  pub choices: Vec<SegmentChoice>,
  pub image_prompt: Option<String>,
  pub is_end: bool,
}

/// Única mutación permitida sobre un segmento ya creado.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentPatch {
  pub image_url: Option<String>,
}
