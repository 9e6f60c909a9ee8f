// story.rs
use crate::CreationMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Cabecera persistida de una historia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
  pub id: Uuid,
  pub user_id: String,
  pub title: String,
  pub genre: String,
  pub theme: String,
  pub setting: String,
  /// Nivel 1..=10.
  pub difficulty: u8,
  pub moral_lesson: Option<String>,
  pub prompt: String,
  pub creation_mode: CreationMode,
  /// Bolsa libre específica del modo (personajes, atmósfera, palabras por
  /// capítulo...). La lee el protocolo de continuación.
  pub metadata: JsonValue,
  /// Sólo en modo plantilla.
  pub template_id: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Registro parcial de historia producido por el pipeline de generación y
/// entregado a `StoryRepository::create_story`.
///
/// `NewStory::default()` es el marcador vacío que devuelve el pipeline
/// cuando la validación falla.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewStory {
  pub user_id: Option<String>,
  pub title: Option<String>,
  pub genre: Option<String>,
  pub theme: Option<String>,
  pub setting: Option<String>,
  pub difficulty: Option<u8>,
  pub moral_lesson: Option<String>,
  pub prompt: Option<String>,
  pub creation_mode: Option<CreationMode>,
  pub metadata: Option<JsonValue>,
  pub template_id: Option<String>,
}

impl NewStory {
  pub fn is_empty(&self) -> bool {
    self == &NewStory::default()
  }

  /// Materializa el registro con un id nuevo. Falla si faltan los campos
  /// que la cabecera exige (usuario, título, prompt, modo).
  pub fn into_story(self) -> Result<Story, crate::DomainError> {
    let missing = |field: &str| crate::DomainError::ValidationError(format!("falta el campo '{}' de la historia", field));
    let user_id = self.user_id.ok_or_else(|| missing("user_id"))?;
    let title = self.title.ok_or_else(|| missing("title"))?;
    let prompt = self.prompt.ok_or_else(|| missing("prompt"))?;
    let creation_mode = self.creation_mode.ok_or_else(|| missing("creation_mode"))?;
    let difficulty = self.difficulty.unwrap_or(5).clamp(1, 10);
    Ok(Story { id: Uuid::new_v4(),
               user_id,
               title,
               genre: self.genre.unwrap_or_default(),
               theme: self.theme.unwrap_or_default(),
               setting: self.setting.unwrap_or_default(),
               difficulty,
               moral_lesson: self.moral_lesson,
               prompt,
               creation_mode,
               metadata: self.metadata.unwrap_or_else(|| JsonValue::Object(Default::default())),
               template_id: self.template_id,
               created_at: Utc::now() })
  }
}
