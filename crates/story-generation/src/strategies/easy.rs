// easy.rs
//! Modo fácil: dificultad, género y un personaje. Todo lo demás sale de las
//! tablas por género.
use crate::age_mapping::{calculate_difficulty, calculate_word_count, Difficulty};
use crate::context::{GenerationContext, ValidationOutcome};
use crate::errors::GenerationError;
use crate::genres::genre_profile;
use crate::strategy::helpers::{clean, clean_traits, generate_title, is_blank, segment_instructions, title_case,
                               writing_style};
use crate::strategy::StoryStrategy;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use story_domain::{Character, CreationMode, NewStory};

const DEFAULT_TRAITS: [&str; 3] = ["brave", "curious", "kind"];
const MAX_TRAITS: usize = 5;
const TITLE_TEMPLATES: [&str; 4] = ["{hero} and the {subject} Adventure",
                                    "The Amazing Journey of {hero}",
                                    "{hero}'s Big {subject} Day",
                                    "{hero} Saves the Day"];

#[derive(Default, Clone)]
pub struct EasyModeStrategy;

/// Entrada del asistente rápido.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EasyModeInput {
  pub difficulty: Option<Difficulty>,
  pub genre: Option<String>,
  pub character_name: Option<String>,
  pub character_traits: Vec<String>,
  pub character_description: Option<String>,
  /// Si se indica, la dificultad se deriva de la edad.
  pub child_age: Option<u8>,
  pub theme: Option<String>,
  pub setting: Option<String>,
}

/// Datos normalizados que recorren las fases 2..6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EasyModeData {
  pub difficulty: u8,
  pub word_count: u32,
  pub genre: String,
  pub character: Character,
  pub theme: String,
  pub setting: String,
  pub moral_lesson: String,
  pub conflict: String,
  pub child_age: Option<u8>,
}

impl StoryStrategy for EasyModeStrategy {
  type Input = EasyModeInput;
  type Data = EasyModeData;

  const MODE: CreationMode = CreationMode::Easy;

  fn validate_input(&self, input: &EasyModeInput) -> ValidationOutcome {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    if input.difficulty.as_ref().map_or(true, Difficulty::is_blank) {
      errors.push("Difficulty level is required".to_string());
    }
    if is_blank(&input.genre) {
      errors.push("Genre is required".to_string());
    }
    if is_blank(&input.character_name) {
      errors.push("Character name is required".to_string());
    }
    if input.character_traits.len() > MAX_TRAITS {
      warnings.push(format!("Only the first {} character traits will be used", MAX_TRAITS));
    }
    ValidationOutcome::from_checks(errors, warnings)
  }

  fn transform_data(&self, input: EasyModeInput) -> Result<EasyModeData, GenerationError> {
    let difficulty_input = input.difficulty.unwrap_or_else(|| Difficulty::Label("medium".into()));
    let word_count = calculate_word_count(&difficulty_input);
    let difficulty = match input.child_age {
      Some(age) => calculate_difficulty(age),
      None => difficulty_input.level().unwrap_or(5),
    };

    let mut traits = clean_traits(input.character_traits);
    traits.truncate(MAX_TRAITS);
    let name = clean(input.character_name).unwrap_or_default();
    let character = Character::new("character-1", name, Character::MAIN_ROLE)
                      .with_description(clean(input.character_description).unwrap_or_default())
                      .with_traits(traits);

    Ok(EasyModeData { difficulty,
                      word_count,
                      genre: clean(input.genre).unwrap_or_default().to_lowercase(),
                      character,
                      theme: clean(input.theme).unwrap_or_default(),
                      setting: clean(input.setting).unwrap_or_default(),
                      moral_lesson: String::new(),
                      conflict: String::new(),
                      child_age: input.child_age })
  }

  fn enrich_with_defaults(&self, mut data: EasyModeData) -> Result<EasyModeData, GenerationError> {
    let profile = genre_profile(&data.genre);
    if data.theme.is_empty() {
      data.theme = profile.theme.to_string();
    }
    if data.setting.is_empty() {
      data.setting = profile.setting.to_string();
    }
    if data.moral_lesson.is_empty() {
      data.moral_lesson = profile.moral_lesson.to_string();
    }
    Ok(data)
  }

  fn apply_mode_specific_logic(&self, mut data: EasyModeData, _ctx: &GenerationContext) -> Result<EasyModeData, GenerationError> {
    if data.conflict.is_empty() {
      data.conflict = genre_profile(&data.genre).conflict.to_string();
    }
    if data.character.traits.is_empty() {
      data.character.traits = DEFAULT_TRAITS.iter().map(|t| t.to_string()).collect();
    }
    if data.character.description.is_empty() {
      data.character.description = format!("A {} young hero", data.character.traits.join(", "));
    }
    Ok(data)
  }

  fn generate_prompt(&self, data: &EasyModeData) -> String {
    format!("Create an interactive children's story in the {genre} genre.\n\
             Main character: {name}, {description}. Personality: {traits}.\n\
             Setting: {setting}.\n\
             Theme: {theme}.\n\
             Conflict: {name} {conflict}.\n\
             Moral lesson to weave in gently: {moral}.\n\
             Writing style: {style}\n\
             {segment}",
            genre = data.genre,
            name = data.character.name,
            description = data.character.description,
            traits = data.character.traits.join(", "),
            setting = data.setting,
            theme = data.theme,
            conflict = lowercase_first(&data.conflict),
            moral = data.moral_lesson,
            style = writing_style(data.difficulty),
            segment = segment_instructions(data.word_count))
  }

  fn build_story_object(&self,
                        data: &EasyModeData,
                        prompt: String,
                        _ctx: &GenerationContext,
                        rng: &mut dyn RngCore)
                        -> NewStory {
    let title = generate_title(&TITLE_TEMPLATES, &data.character.name, &title_case(&data.genre), rng);
    NewStory { title: Some(title),
               genre: Some(data.genre.clone()),
               theme: Some(data.theme.clone()),
               setting: Some(data.setting.clone()),
               difficulty: Some(data.difficulty),
               moral_lesson: Some(data.moral_lesson.clone()),
               prompt: Some(prompt),
               metadata: Some(json!({
                 "characters": [data.character.clone()],
                 "conflict": data.conflict,
                 "wordsPerChapter": data.word_count,
                 "childAge": data.child_age
               })),
               ..Default::default() }
  }
}

fn lowercase_first(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;
  use rand_chacha::ChaCha8Rng;

  fn mira_space_input() -> EasyModeInput {
    serde_json::from_value(json!({
      "difficulty": "short",
      "genre": "space",
      "characterName": "Mira",
      "characterTraits": []
    })).unwrap()
  }

  #[test]
  fn space_story_runs_through_every_phase() {
    let strategy = EasyModeStrategy;
    let input = mira_space_input();
    assert!(strategy.validate_input(&input).is_valid);

    let data = strategy.transform_data(input).unwrap();
    assert_eq!(data.word_count, 80);

    let data = strategy.enrich_with_defaults(data).unwrap();
    assert_eq!(data.theme, "Exploration and Science");
    assert_eq!(data.setting, "Distant Galaxy");

    let ctx = GenerationContext::new(CreationMode::Easy, "u1", json!({}));
    let data = strategy.apply_mode_specific_logic(data, &ctx).unwrap();
    assert_eq!(data.conflict, "Must return home from a distant planet");
    assert_eq!(data.character.traits, vec!["brave", "curious", "kind"]);
  }

  #[test]
  fn explicit_values_are_not_overwritten() {
    let strategy = EasyModeStrategy;
    let input: EasyModeInput = serde_json::from_value(json!({
      "difficulty": 8,
      "genre": "space",
      "characterName": "  Leo ",
      "characterTraits": ["funny", " ", "loud"],
      "theme": "Family",
      "setting": "Moon Base"
    })).unwrap();
    let ctx = GenerationContext::new(CreationMode::Easy, "u1", json!({}));
    let data = strategy.transform_data(input).unwrap();
    assert_eq!(data.character.name, "Leo");
    assert_eq!(data.character.traits, vec!["funny", "loud"]);
    assert_eq!(data.word_count, 180);
    let data = strategy.apply_mode_specific_logic(strategy.enrich_with_defaults(data).unwrap(), &ctx).unwrap();
    assert_eq!(data.theme, "Family");
    assert_eq!(data.setting, "Moon Base");
    assert_eq!(data.character.traits, vec!["funny", "loud"]);
  }

  #[test]
  fn child_age_drives_difficulty() {
    let input: EasyModeInput = serde_json::from_value(json!({
      "difficulty": "long", "genre": "ocean", "characterName": "Ana", "childAge": 5
    })).unwrap();
    let data = EasyModeStrategy.transform_data(input).unwrap();
    assert_eq!(data.difficulty, 4);
    assert_eq!(data.word_count, 180);
  }

  #[test]
  fn missing_fields_are_reported() {
    let outcome = EasyModeStrategy.validate_input(&EasyModeInput::default());
    assert!(!outcome.is_valid);
    assert_eq!(outcome.errors,
               vec!["Difficulty level is required", "Genre is required", "Character name is required"]);
  }

  #[test]
  fn story_object_carries_prompt_and_metadata() {
    let ctx = GenerationContext::new(CreationMode::Easy, "user-9", serde_json::to_value(mira_space_input()).unwrap());
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let result = EasyModeStrategy.generate_story(&ctx, &mut rng).unwrap();
    assert!(result.is_valid());
    let story = result.story;
    assert_eq!(story.creation_mode, Some(CreationMode::Easy));
    assert_eq!(story.user_id.as_deref(), Some("user-9"));
    let prompt = story.prompt.unwrap();
    assert!(prompt.contains("Mira"));
    assert!(prompt.contains("Distant Galaxy"));
    assert!(prompt.contains("exactly 3"));
    let metadata = story.metadata.unwrap();
    assert_eq!(metadata["wordsPerChapter"], 80);
    assert_eq!(metadata["characters"][0]["name"], "Mira");
    assert!(story.title.unwrap().contains("Mira"));
  }
}
