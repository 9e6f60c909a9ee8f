// template.rs
//! Modo plantilla: historia predefinida personalizada con el nombre del
//! niño y algunos ajustes.
use crate::age_mapping::{calculate_word_count, Difficulty};
use crate::context::{GenerationContext, ValidationOutcome};
use crate::errors::GenerationError;
use crate::genres::genre_profile;
use crate::strategy::helpers::{clean, clean_traits, generate_title, is_blank, segment_instructions, writing_style};
use crate::strategy::StoryStrategy;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use story_domain::{Character, CreationMode, NewStory};

const TITLE_TEMPLATES: [&str; 3] = ["{hero} in {subject}", "{subject}: {hero}'s Story", "{hero} and the {subject}"];

#[derive(Default, Clone)]
pub struct TemplateModeStrategy;

/// Escenario descrito por la plantilla.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateSettings {
  pub location: String,
  pub time_period: String,
  pub atmosphere: String,
  pub description: String,
}

/// Plantilla de historia tal como la entrega el catálogo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryTemplate {
  pub id: String,
  pub name: String,
  pub genre: String,
  pub theme: String,
  pub characters: Vec<Character>,
  pub settings: Option<TemplateSettings>,
  pub conflict: String,
  pub quest: String,
  pub moral_lesson: String,
  pub difficulty: Option<u8>,
}

impl StoryTemplate {
  pub fn main_character(&self) -> Option<&Character> {
    self.characters.iter().find(|c| c.is_main())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateCustomizations {
  /// Rasgos que se añaden al protagonista.
  pub character_traits: Vec<String>,
  /// Texto que se añade a la descripción del escenario.
  pub setting_details: Option<String>,
  pub additional_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateModeInput {
  pub template_id: Option<String>,
  pub template: Option<StoryTemplate>,
  pub child_name: Option<String>,
  pub customizations: TemplateCustomizations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateModeData {
  pub template_id: String,
  pub template_name: String,
  pub child_name: String,
  pub genre: String,
  pub theme: String,
  pub characters: Vec<Character>,
  pub settings: TemplateSettings,
  pub conflict: String,
  pub quest: String,
  pub moral_lesson: String,
  pub difficulty: u8,
  pub word_count: u32,
  pub customizations: TemplateCustomizations,
}

impl StoryStrategy for TemplateModeStrategy {
  type Input = TemplateModeInput;
  type Data = TemplateModeData;

  const MODE: CreationMode = CreationMode::Template;

  fn validate_input(&self, input: &TemplateModeInput) -> ValidationOutcome {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    if is_blank(&input.template_id) || input.template.is_none() {
      errors.push("Template selection is required".to_string());
    }
    if is_blank(&input.child_name) {
      errors.push("Child name is required".to_string());
    }
    if let Some(template) = &input.template {
      if template.main_character().is_none() {
        warnings.push("No main character designated".to_string());
      }
    }
    ValidationOutcome::from_checks(errors, warnings)
  }

  fn transform_data(&self, input: TemplateModeInput) -> Result<TemplateModeData, GenerationError> {
    let template_id = clean(input.template_id).unwrap_or_default();
    let template = input.template.ok_or_else(|| GenerationError::MissingTemplateSettings(template_id.clone()))?;
    let settings = template.settings.ok_or_else(|| GenerationError::MissingTemplateSettings(template_id.clone()))?;

    let characters = template.characters
                             .into_iter()
                             .map(|mut c| {
                               c.name = c.name.trim().to_string();
                               c.description = c.description.trim().to_string();
                               c.role = c.role.trim().to_lowercase();
                               c.traits = clean_traits(c.traits);
                               c
                             })
                             .collect();
    let difficulty = template.difficulty.unwrap_or(5).clamp(1, 10);
    let customizations = TemplateCustomizations { character_traits: clean_traits(input.customizations.character_traits),
                                                  setting_details: clean(input.customizations.setting_details),
                                                  additional_notes: clean(input.customizations.additional_notes) };

    Ok(TemplateModeData { template_id,
                          template_name: template.name.trim().to_string(),
                          child_name: clean(input.child_name).unwrap_or_default(),
                          genre: template.genre.trim().to_lowercase(),
                          theme: template.theme.trim().to_string(),
                          characters,
                          settings: TemplateSettings { location: settings.location.trim().to_string(),
                                                       time_period: settings.time_period.trim().to_string(),
                                                       atmosphere: settings.atmosphere.trim().to_string(),
                                                       description: settings.description.trim().to_string() },
                          conflict: template.conflict.trim().to_string(),
                          quest: template.quest.trim().to_string(),
                          moral_lesson: template.moral_lesson.trim().to_string(),
                          difficulty,
                          word_count: calculate_word_count(&Difficulty::Level(difficulty as i64)),
                          customizations })
  }

  fn enrich_with_defaults(&self, mut data: TemplateModeData) -> Result<TemplateModeData, GenerationError> {
    let profile = genre_profile(&data.genre);
    if data.theme.is_empty() {
      data.theme = profile.theme.to_string();
    }
    if data.settings.location.is_empty() {
      data.settings.location = profile.setting.to_string();
    }
    if data.settings.atmosphere.is_empty() {
      data.settings.atmosphere = profile.atmosphere.to_string();
    }
    if data.conflict.is_empty() {
      data.conflict = profile.conflict.to_string();
    }
    if data.moral_lesson.is_empty() {
      data.moral_lesson = profile.moral_lesson.to_string();
    }
    if data.quest.is_empty() {
      data.quest = format!("Find a way through {}", data.settings.location);
    }
    Ok(data)
  }

  fn apply_mode_specific_logic(&self,
                               mut data: TemplateModeData,
                               _ctx: &GenerationContext)
                               -> Result<TemplateModeData, GenerationError> {
    let child_name = data.child_name.clone();
    let extra_traits = data.customizations.character_traits.clone();
    if let Some(main) = data.characters.iter_mut().find(|c| c.is_main()) {
      main.name = child_name;
      for t in extra_traits {
        if !main.traits.iter().any(|existing| existing.eq_ignore_ascii_case(&t)) {
          main.traits.push(t);
        }
      }
    }
    if let Some(details) = &data.customizations.setting_details {
      data.settings.description = if data.settings.description.is_empty() {
        details.clone()
      } else {
        format!("{} {}", data.settings.description, details)
      };
    }
    Ok(data)
  }

  fn generate_prompt(&self, data: &TemplateModeData) -> String {
    let characters = data.characters
                         .iter()
                         .map(|c| format!("- {} ({}): {} Traits: {}.", c.name, c.role, c.description, c.traits.join(", ")))
                         .collect::<Vec<_>>()
                         .join("\n");
    let mut prompt = format!("Create an interactive children's story based on the \"{template}\" template.\n\
                              The hero is {child}.\n\
                              Characters:\n{characters}\n\
                              Setting: {location}, {period}. Atmosphere: {atmosphere}. {description}\n\
                              Theme: {theme}.\n\
                              Conflict: {conflict}.\n\
                              Quest: {quest}.\n\
                              Moral lesson: {moral}.\n\
                              Writing style: {style}\n",
                             template = data.template_name,
                             child = data.child_name,
                             characters = characters,
                             location = data.settings.location,
                             period = data.settings.time_period,
                             atmosphere = data.settings.atmosphere,
                             description = data.settings.description,
                             theme = data.theme,
                             conflict = data.conflict,
                             quest = data.quest,
                             moral = data.moral_lesson,
                             style = writing_style(data.difficulty));
    if let Some(notes) = &data.customizations.additional_notes {
      prompt.push_str(&format!("Additional notes from the family: {}\n", notes));
    }
    prompt.push_str(&segment_instructions(data.word_count));
    prompt
  }

  fn build_story_object(&self,
                        data: &TemplateModeData,
                        prompt: String,
                        _ctx: &GenerationContext,
                        rng: &mut dyn RngCore)
                        -> NewStory {
    let subject = if data.template_name.is_empty() { &data.settings.location } else { &data.template_name };
    NewStory { title: Some(generate_title(&TITLE_TEMPLATES, &data.child_name, subject, rng)),
               genre: Some(data.genre.clone()),
               theme: Some(data.theme.clone()),
               setting: Some(data.settings.location.clone()),
               difficulty: Some(data.difficulty),
               moral_lesson: Some(data.moral_lesson.clone()),
               prompt: Some(prompt),
               metadata: Some(json!({
                 "templateId": data.template_id,
                 "templateName": data.template_name,
                 "characters": data.characters,
                 "settings": data.settings,
                 "atmosphere": data.settings.atmosphere,
                 "conflict": data.conflict,
                 "quest": data.quest,
                 "wordsPerChapter": data.word_count,
                 "customizations": data.customizations
               })),
               template_id: Some(data.template_id.clone()),
               ..Default::default() }
  }
}
