// character.rs
use serde::{Deserialize, Serialize};

/// Personaje embebido en el contexto de generación. No se persiste por
/// separado: vive dentro del `metadata` de la historia.
///
/// `role` es un texto abierto (`main`, `antagonist`, `supporting`, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
  pub id: String,
  pub name: String,
  pub description: String,
  pub role: String,
  pub traits: Vec<String>,
}

impl Character {
  pub const MAIN_ROLE: &'static str = "main";

  pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
    Self { id: id.into(), name: name.into(), role: role.into(), ..Default::default() }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn with_traits<I, S>(mut self, traits: I) -> Self
    where I: IntoIterator<Item = S>,
          S: Into<String>
  {
    self.traits = traits.into_iter().map(Into::into).collect();
    self
  }

  pub fn is_main(&self) -> bool {
    self.role.eq_ignore_ascii_case(Self::MAIN_ROLE)
  }
}
