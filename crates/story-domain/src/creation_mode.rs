use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Modo de creación de una historia. Selecciona la estrategia que procesa
/// la entrada del usuario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreationMode {
    Easy,
    Template,
    Advanced,
}

impl CreationMode {
    /// Todos los modos conocidos, en el orden en que se registran por defecto.
    pub const ALL: [CreationMode; 3] = [CreationMode::Easy, CreationMode::Template, CreationMode::Advanced];
}

impl fmt::Display for CreationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CreationMode::Easy => "easy",
            CreationMode::Template => "template",
            CreationMode::Advanced => "advanced",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for CreationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(CreationMode::Easy),
            "template" => Ok(CreationMode::Template),
            "advanced" => Ok(CreationMode::Advanced),
            other => Err(format!("modo de creación desconocido: {}", other)),
        }
    }
}
