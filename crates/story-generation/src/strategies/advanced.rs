// advanced.rs
//! Modo avanzado: el usuario describe personajes, escenario y trama. La
//! estrategia añade relaciones entre personajes, descripción sensorial del
//! escenario y un arco argumental de cinco tiempos.
use crate::age_mapping::{calculate_word_count, difficulty_to_age, Difficulty};
use crate::context::{GenerationContext, ValidationOutcome};
use crate::errors::GenerationError;
use crate::genres::genre_profile;
use crate::strategy::helpers::{clean, clean_traits, generate_title, is_blank, segment_instructions, writing_style};
use crate::strategy::StoryStrategy;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use story_domain::{Character, CreationMode, NewStory};

const MAX_CHARACTERS: usize = 5;
const DEFAULT_DIFFICULTY: u8 = 5;
const TITLE_TEMPLATES: [&str; 4] = ["{hero} and the Quest to {subject}",
                                    "The Legend of {hero}",
                                    "{hero}'s Great Adventure",
                                    "How {hero} Learned to {subject}"];

#[derive(Default, Clone)]
pub struct AdvancedModeStrategy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvancedModeInput {
  pub child_name: Option<String>,
  pub difficulty: Option<u8>,
  pub genre: Option<String>,
  pub theme: Option<String>,
  pub characters: Vec<Character>,
  pub location: Option<String>,
  pub time_period: Option<String>,
  pub atmosphere: Option<String>,
  pub conflict: Option<String>,
  pub quest: Option<String>,
  pub moral_lesson: Option<String>,
  pub additional_details: Option<String>,
  /// Etiqueta o nivel de longitud; por defecto se usa la dificultad.
  pub length: Option<Difficulty>,
}

/// Contenido narrativo sintetizado en la fase 4.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryBlueprint {
  pub relationships: Vec<String>,
  pub sensory_setting: String,
  pub plot_arc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedModeData {
  pub child_name: String,
  pub difficulty: u8,
  pub target_age: u8,
  pub word_count: u32,
  pub genre: String,
  pub theme: String,
  pub characters: Vec<Character>,
  pub location: String,
  pub time_period: String,
  pub atmosphere: String,
  pub conflict: String,
  pub quest: String,
  pub moral_lesson: String,
  pub additional_details: Option<String>,
  pub blueprint: StoryBlueprint,
}

impl AdvancedModeData {
  /// Protagonista: el personaje con rol `main` o, si no hay, el primero.
  pub fn lead(&self) -> Option<&Character> {
    self.characters.iter().find(|c| c.is_main()).or_else(|| self.characters.first())
  }
}

impl StoryStrategy for AdvancedModeStrategy {
  type Input = AdvancedModeInput;
  type Data = AdvancedModeData;

  const MODE: CreationMode = CreationMode::Advanced;

  fn validate_input(&self, input: &AdvancedModeInput) -> ValidationOutcome {
    let required = [(&input.child_name, "Child name is required"),
                    (&input.genre, "Genre is required"),
                    (&input.theme, "Theme is required"),
                    (&input.location, "Location is required"),
                    (&input.time_period, "Time period is required"),
                    (&input.atmosphere, "Atmosphere is required"),
                    (&input.conflict, "Conflict is required"),
                    (&input.quest, "Quest or goal is required")];
    let mut errors: Vec<String> = required.iter()
                                          .filter(|(value, _)| is_blank(value))
                                          .map(|(_, message)| message.to_string())
                                          .collect();
    let mut warnings = Vec::new();

    if input.characters.is_empty() {
      errors.push("At least one character is required".to_string());
    } else {
      if input.characters.iter().any(|c| c.name.trim().is_empty()) {
        errors.push("Every character needs a name".to_string());
      }
      if !input.characters.iter().any(|c| c.is_main()) {
        warnings.push("No main character designated".to_string());
      }
      if input.characters.len() > MAX_CHARACTERS {
        warnings.push("Too many characters may make the story hard to follow".to_string());
      }
    }
    if input.difficulty.is_some_and(|d| !(1..=10).contains(&d)) {
      warnings.push(format!("Difficulty out of range, using {}", DEFAULT_DIFFICULTY));
    }
    ValidationOutcome::from_checks(errors, warnings)
  }

  fn transform_data(&self, input: AdvancedModeInput) -> Result<AdvancedModeData, GenerationError> {
    let difficulty = input.difficulty.filter(|d| (1..=10).contains(d)).unwrap_or(DEFAULT_DIFFICULTY);
    let word_count = match &input.length {
      Some(length) => calculate_word_count(length),
      None => calculate_word_count(&Difficulty::Level(difficulty as i64)),
    };
    let characters = input.characters
                          .into_iter()
                          .map(|mut c| {
                            c.id = c.id.trim().to_string();
                            c.name = c.name.trim().to_string();
                            c.description = c.description.trim().to_string();
                            c.role = c.role.trim().to_lowercase();
                            c.traits = clean_traits(c.traits);
                            c
                          })
                          .collect();

    Ok(AdvancedModeData { child_name: clean(input.child_name).unwrap_or_default(),
                          difficulty,
                          target_age: difficulty_to_age(difficulty),
                          word_count,
                          genre: clean(input.genre).unwrap_or_default().to_lowercase(),
                          theme: clean(input.theme).unwrap_or_default(),
                          characters,
                          location: clean(input.location).unwrap_or_default(),
                          time_period: clean(input.time_period).unwrap_or_default(),
                          atmosphere: clean(input.atmosphere).unwrap_or_default(),
                          conflict: clean(input.conflict).unwrap_or_default(),
                          quest: clean(input.quest).unwrap_or_default(),
                          moral_lesson: clean(input.moral_lesson).unwrap_or_default(),
                          additional_details: clean(input.additional_details),
                          blueprint: StoryBlueprint::default() })
  }

  fn enrich_with_defaults(&self, mut data: AdvancedModeData) -> Result<AdvancedModeData, GenerationError> {
    if data.moral_lesson.is_empty() {
      data.moral_lesson = genre_profile(&data.genre).moral_lesson.to_string();
    }
    for (i, c) in data.characters.iter_mut().enumerate() {
      if c.id.is_empty() {
        c.id = format!("character-{}", i + 1);
      }
      if c.role.is_empty() {
        c.role = "supporting".to_string();
      }
      if c.description.is_empty() {
        c.description = format!("{}, a {} character", c.name, c.role);
      }
    }
    Ok(data)
  }

  fn apply_mode_specific_logic(&self,
                               mut data: AdvancedModeData,
                               _ctx: &GenerationContext)
                               -> Result<AdvancedModeData, GenerationError> {
    let lead = data.lead().map(|c| c.name.clone()).unwrap_or_else(|| data.child_name.clone());
    let relationships = data.characters
                            .iter()
                            .filter(|c| c.name != lead)
                            .map(|c| {
                              let relation = match c.role.as_str() {
                                "antagonist" => "is challenged by",
                                "supporting" => "is helped by",
                                "mentor" => "is guided by",
                                _ => "travels with",
                              };
                              format!("{} {} {} ({})", lead, relation, c.name, c.description)
                            })
                            .collect();

    let profile = genre_profile(&data.genre);
    let sensory_setting = format!("{} during {}: a {} place full of {}.",
                                  data.location, data.time_period, data.atmosphere, profile.sensory);

    let plot_arc = vec![format!("Setup: introduce {} and their world in {}.", lead, data.location),
                        format!("Inciting incident: {}.", data.conflict),
                        format!("Rising action: {} sets out to {}, facing obstacles along the way.",
                                lead,
                                lowercase_first(&data.quest)),
                        format!("Climax: {} must use what they have learned to face the biggest challenge.", lead),
                        format!("Resolution: the quest ends and {} discovers that {}.",
                                lead,
                                lowercase_first(&data.moral_lesson))];

    data.blueprint = StoryBlueprint { relationships, sensory_setting, plot_arc };
    Ok(data)
  }

  fn generate_prompt(&self, data: &AdvancedModeData) -> String {
    let characters = data.characters
                         .iter()
                         .map(|c| {
                           let traits = if c.traits.is_empty() { String::new() } else { format!(" Traits: {}.", c.traits.join(", ")) };
                           format!("- {} ({}): {}.{}", c.name, c.role, c.description, traits)
                         })
                         .collect::<Vec<_>>()
                         .join("\n");
    let relationships = data.blueprint.relationships.join("\n- ");
    let plot = data.blueprint
                   .plot_arc
                   .iter()
                   .enumerate()
                   .map(|(i, beat)| format!("{}. {}", i + 1, beat))
                   .collect::<Vec<_>>()
                   .join("\n");

    let mut prompt = format!("Create an interactive {genre} story for {child}, a reader around {age} years old.\n\
                              Theme: {theme}.\n\
                              Characters:\n{characters}\n",
                             genre = data.genre,
                             child = data.child_name,
                             age = data.target_age,
                             theme = data.theme,
                             characters = characters);
    if !relationships.is_empty() {
      prompt.push_str(&format!("Relationships:\n- {}\n", relationships));
    }
    prompt.push_str(&format!("Setting: {}\n\
                              Conflict: {}.\n\
                              Quest: {}.\n\
                              Moral lesson: {}.\n\
                              Plot arc:\n{}\n\
                              Writing style: {}\n",
                             data.blueprint.sensory_setting,
                             data.conflict,
                             data.quest,
                             data.moral_lesson,
                             plot,
                             writing_style(data.difficulty)));
    if let Some(details) = &data.additional_details {
      prompt.push_str(&format!("Additional details: {}\n", details));
    }
    prompt.push_str(&segment_instructions(data.word_count));
    prompt
  }

  fn build_story_object(&self,
                        data: &AdvancedModeData,
                        prompt: String,
                        _ctx: &GenerationContext,
                        rng: &mut dyn RngCore)
                        -> NewStory {
    let hero = data.lead().map(|c| c.name.as_str()).unwrap_or(data.child_name.as_str());
    NewStory { title: Some(generate_title(&TITLE_TEMPLATES, hero, &data.quest, rng)),
               genre: Some(data.genre.clone()),
               theme: Some(data.theme.clone()),
               setting: Some(format!("{}, {}", data.location, data.time_period)),
               difficulty: Some(data.difficulty),
               moral_lesson: Some(data.moral_lesson.clone()),
               prompt: Some(prompt),
               metadata: Some(json!({
                 "childName": data.child_name,
                 "targetAge": data.target_age,
                 "characters": data.characters,
                 "location": data.location,
                 "timePeriod": data.time_period,
                 "atmosphere": data.atmosphere,
                 "conflict": data.conflict,
                 "quest": data.quest,
                 "wordsPerChapter": data.word_count,
                 "relationships": data.blueprint.relationships,
                 "sensorySetting": data.blueprint.sensory_setting,
                 "plotArc": data.blueprint.plot_arc,
                 "additionalDetails": data.additional_details
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
