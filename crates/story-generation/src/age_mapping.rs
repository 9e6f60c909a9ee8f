// age_mapping.rs
//! Conversión entre dificultad (1..=10), edad del lector (3..=12) y
//! palabras por capítulo.
//!
//! Hay dos tablas de edad y NO son inversas exactas: `difficulty_to_age`
//! (modo avanzado) avanza de uno en uno, mientras que `calculate_difficulty`
//! (modo fácil) agrupa edades en bandas pares. Por ejemplo la dificultad 1
//! da 3 años, y 3 años vuelve como dificultad 2. Se mantienen separadas a
//! propósito hasta que producto decida unificarlas.
use serde::{Deserialize, Serialize};

/// Palabras por capítulo cuando la entrada no está en la tabla.
pub const DEFAULT_WORDS_PER_CHAPTER: u32 = 120;

/// Dificultad tal como llega del formulario: un nivel numérico o una
/// etiqueta cualitativa (`short`, `medium`, `long`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Difficulty {
  Level(i64),
  Label(String),
}

impl Difficulty {
  /// Nivel 1..=10 equivalente, si la entrada es reconocible.
  pub fn level(&self) -> Option<u8> {
    match self {
      Difficulty::Level(n) if (1..=10).contains(n) => Some(*n as u8),
      Difficulty::Level(_) => None,
      Difficulty::Label(label) => match label.trim().to_lowercase().as_str() {
        "short" => Some(3),
        "medium" => Some(5),
        "long" => Some(7),
        other => other.parse::<i64>().ok().and_then(|n| Difficulty::Level(n).level()),
      },
    }
  }

  pub fn is_blank(&self) -> bool {
    matches!(self, Difficulty::Label(l) if l.trim().is_empty())
  }
}

impl From<i64> for Difficulty {
  fn from(n: i64) -> Self {
    Difficulty::Level(n)
  }
}

impl From<&str> for Difficulty {
  fn from(s: &str) -> Self {
    Difficulty::Label(s.to_string())
  }
}

/// Tabla del modo avanzado: dificultad -> edad. Valores fuera de rango se
/// acotan a 1..=10.
pub fn difficulty_to_age(difficulty: u8) -> u8 {
  match difficulty.clamp(1, 10) {
    1 => 3,
    2 => 4,
    3 => 5,
    4 => 6,
    5 => 7,
    6 => 8,
    7 => 9,
    8 => 10,
    9 => 11,
    _ => 12,
  }
}

/// Tabla del modo fácil: edad -> dificultad, por bandas de dos años.
pub fn calculate_difficulty(age: u8) -> u8 {
  match age {
    0..=4 => 2,
    5..=6 => 4,
    7..=8 => 6,
    9..=10 => 8,
    _ => 10,
  }
}

/// Palabras por capítulo para una etiqueta o un nivel. Nunca falla:
/// cualquier entrada desconocida devuelve `DEFAULT_WORDS_PER_CHAPTER`.
pub fn calculate_word_count(input: &Difficulty) -> u32 {
  match input {
    Difficulty::Label(label) => match label.trim().to_lowercase().as_str() {
      "short" => 80,
      "medium" => 120,
      "long" => 180,
      _ => DEFAULT_WORDS_PER_CHAPTER,
    },
    Difficulty::Level(level) => match *level {
      1 => 50,
      2 => 60,
      3 => 80,
      4 => 100,
      5 => 120,
      6 => 140,
      7 => 160,
      8 => 180,
      9 => 200,
      10 => 220,
      _ => DEFAULT_WORDS_PER_CHAPTER,
    },
  }
}
