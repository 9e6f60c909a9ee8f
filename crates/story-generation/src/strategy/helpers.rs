//! Utilidades compartidas por las estrategias.
use rand::Rng;
use rand::RngCore;

/// Elige una plantilla de título de forma uniforme y sustituye `{hero}` y
/// `{subject}`.
pub fn generate_title(templates: &[&str], hero: &str, subject: &str, rng: &mut dyn RngCore) -> String {
  if templates.is_empty() {
    return format!("{}'s Story", hero);
  }
  let idx = rng.gen_range(0..templates.len());
  templates[idx].replace("{hero}", hero).replace("{subject}", subject)
}

/// Guía de estilo de escritura según la dificultad.
pub fn writing_style(difficulty: u8) -> &'static str {
  match difficulty {
    0..=3 => "Use very simple words, short sentences and lots of repetition. Keep every paragraph to two or three sentences.",
    4..=6 => "Use clear, friendly language with some new vocabulary explained by context. Mix short and medium sentences.",
    _ => "Use rich vocabulary, varied sentence structure and some descriptive language, while keeping the story age-appropriate.",
  }
}

/// Instrucciones comunes sobre la forma de cada segmento.
pub fn segment_instructions(words_per_chapter: u32) -> String {
  format!("Write the opening segment in about {} words. End it at a decision point and offer exactly 3 short, \
           distinct choices for what the hero could do next.",
          words_per_chapter)
}

/// Recorta y convierte en `None` los textos vacíos.
pub fn clean(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Recorta cada rasgo y descarta los vacíos.
pub fn clean_traits(traits: Vec<String>) -> Vec<String> {
  traits.into_iter().map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect()
}

pub fn is_blank(value: &Option<String>) -> bool {
  value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Primera letra de cada palabra en mayúscula (`"space"` -> `"Space"`).
pub fn title_case(value: &str) -> String {
  value.split_whitespace()
       .map(|w| {
         let mut chars = w.chars();
         match chars.next() {
           Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
           None => String::new(),
         }
       })
       .collect::<Vec<_>>()
       .join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;
  use rand_chacha::ChaCha8Rng;

  const TEMPLATES: [&str; 4] = ["{hero} and the {subject}", "The {subject} of {hero}", "{hero}'s Quest", "Hello {hero}"];

  #[test]
  fn seeded_rng_picks_a_predictable_template() {
    let expected_idx = ChaCha8Rng::seed_from_u64(7).gen_range(0..TEMPLATES.len());
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let title = generate_title(&TEMPLATES, "Mira", "Comet", &mut rng);
    let expected = TEMPLATES[expected_idx].replace("{hero}", "Mira").replace("{subject}", "Comet");
    assert_eq!(title, expected);
  }

  #[test]
  fn empty_template_list_has_a_fallback() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    assert_eq!(generate_title(&[], "Ana", "x", &mut rng), "Ana's Story");
  }

  #[test]
  fn text_cleanup_helpers() {
    assert_eq!(clean(Some("  hi ".into())), Some("hi".into()));
    assert_eq!(clean(Some("   ".into())), None);
    assert_eq!(clean_traits(vec![" brave ".into(), "".into(), "  ".into()]), vec!["brave".to_string()]);
    assert!(is_blank(&None));
    assert_eq!(title_case("deep space adventure"), "Deep Space Adventure");
  }

  #[test]
  fn writing_style_changes_with_difficulty() {
    assert_ne!(writing_style(1), writing_style(5));
    assert_ne!(writing_style(5), writing_style(9));
  }
}
