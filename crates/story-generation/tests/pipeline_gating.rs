use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use story_domain::{CreationMode, NewStory};
use story_generation::strategy::StoryStrategy;
use story_generation::{AdvancedModeStrategy, EasyModeStrategy, GenerationContext, GenerationError, StrategyFactory,
                       TemplateModeStrategy, ValidationOutcome};

/// Estrategia espía: cuenta cuántas veces se invoca cada fase.
#[derive(Default)]
struct SpyStrategy {
  transform: AtomicUsize,
  enrich: AtomicUsize,
  mode_logic: AtomicUsize,
  prompt: AtomicUsize,
  build: AtomicUsize,
}

#[derive(Deserialize)]
struct SpyInput {
  ok: bool,
}

impl SpyStrategy {
  fn later_phase_calls(&self) -> usize {
    [&self.transform, &self.enrich, &self.mode_logic, &self.prompt, &self.build].iter()
                                                                               .map(|c| c.load(Ordering::SeqCst))
                                                                               .sum()
  }
}

impl StoryStrategy for SpyStrategy {
  type Input = SpyInput;
  type Data = ();

  const MODE: CreationMode = CreationMode::Easy;

  fn validate_input(&self, input: &SpyInput) -> ValidationOutcome {
    if input.ok {
      ValidationOutcome::from_checks(vec![], vec!["just a warning".into()])
    } else {
      ValidationOutcome::invalid("nope")
    }
  }

  fn transform_data(&self, _input: SpyInput) -> Result<(), GenerationError> {
    self.transform.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }

  fn enrich_with_defaults(&self, data: ()) -> Result<(), GenerationError> {
    self.enrich.fetch_add(1, Ordering::SeqCst);
    Ok(data)
  }

  fn apply_mode_specific_logic(&self, data: (), _ctx: &GenerationContext) -> Result<(), GenerationError> {
    self.mode_logic.fetch_add(1, Ordering::SeqCst);
    Ok(data)
  }

  fn generate_prompt(&self, _data: &()) -> String {
    self.prompt.fetch_add(1, Ordering::SeqCst);
    "prompt".into()
  }

  fn build_story_object(&self, _data: &(), prompt: String, _ctx: &GenerationContext, _rng: &mut dyn RngCore) -> NewStory {
    self.build.fetch_add(1, Ordering::SeqCst);
    NewStory { title: Some("Spy".into()), prompt: Some(prompt), ..Default::default() }
  }
}

fn rng() -> ChaCha8Rng {
  ChaCha8Rng::seed_from_u64(42)
}

#[test]
fn invalid_input_never_reaches_later_phases() {
  let spy = SpyStrategy::default();
  let ctx = GenerationContext::new(CreationMode::Easy, "u1", json!({"ok": false}));
  let result = spy.generate_story(&ctx, &mut rng()).unwrap();
  assert!(result.story.is_empty());
  assert_eq!(result.validation_errors, Some(vec!["nope".to_string()]));
  assert_eq!(spy.later_phase_calls(), 0);

  // malformed raw data is a validation failure too
  let ctx = GenerationContext::new(CreationMode::Easy, "u1", json!({"ok": "yes"}));
  let result = spy.generate_story(&ctx, &mut rng()).unwrap();
  assert!(result.story.is_empty());
  assert!(result.validation_errors.unwrap()[0].starts_with("Invalid input"));
  assert_eq!(spy.later_phase_calls(), 0);
}

#[test]
fn valid_input_runs_each_phase_once() {
  let spy = SpyStrategy::default();
  let ctx = GenerationContext::new(CreationMode::Easy, "u7", json!({"ok": true}));
  let result = spy.generate_story(&ctx, &mut rng()).unwrap();
  assert!(result.is_valid());
  assert_eq!(spy.later_phase_calls(), 5);
  assert_eq!(result.warnings, vec!["just a warning"]);
  assert_eq!(result.story.creation_mode, Some(CreationMode::Easy));
  assert_eq!(result.story.user_id.as_deref(), Some("u7"));
  assert!(result.metadata.processing_time_ms >= 0);
}

#[test]
fn every_builtin_strategy_gates_on_validation() {
  let factory = StrategyFactory::default();
  for mode in CreationMode::ALL {
    let ctx = GenerationContext::new(mode, "u1", json!({}));
    let result = factory.generate(&ctx, &mut rng()).unwrap();
    assert!(result.story.is_empty(), "mode {} produced a story from empty input", mode);
    assert!(!result.validation_errors.unwrap().is_empty());
  }
}

#[test]
fn advanced_story_without_quest_is_rejected() {
  let ctx = GenerationContext::new(CreationMode::Advanced,
                                   "u1",
                                   json!({
                                     "childName": "Sam",
                                     "genre": "fantasy",
                                     "theme": "Courage",
                                     "characters": [{"name": "Sam", "role": "main"}],
                                     "location": "Misty Mountains",
                                     "timePeriod": "long ago",
                                     "atmosphere": "foggy",
                                     "conflict": "The bridge vanished"
                                   }));
  let result = AdvancedModeStrategy.generate_story(&ctx, &mut rng()).unwrap();
  assert_eq!(result.story, NewStory::default());
  assert!(result.validation_errors.unwrap().contains(&"Quest or goal is required".to_string()));
}

#[test]
fn context_mode_must_match_strategy() {
  let ctx = GenerationContext::new(CreationMode::Template, "u1", json!({}));
  let err = EasyModeStrategy.generate_story(&ctx, &mut rng()).unwrap_err();
  assert!(matches!(err,
                   GenerationError::ModeMismatch { expected: CreationMode::Easy, actual: CreationMode::Template }));
}

#[test]
fn factory_resolves_registered_modes_only() {
  let factory = StrategyFactory::default();
  assert_eq!(factory.supported_modes(),
             vec![CreationMode::Easy, CreationMode::Template, CreationMode::Advanced]);
  assert_eq!(factory.get_strategy(CreationMode::Template).unwrap().mode(), CreationMode::Template);

  let partial = StrategyFactory::empty().register_strategy(CreationMode::Easy, Arc::new(EasyModeStrategy));
  let err = partial.get_strategy(CreationMode::Advanced).err().unwrap();
  assert!(matches!(err, GenerationError::NoStrategy(CreationMode::Advanced)));
  assert_eq!(err.to_string(), "No hay estrategia para el modo: advanced");
}

#[test]
fn last_registration_wins() {
  let spy = Arc::new(SpyStrategy::default());
  let factory = StrategyFactory::default().register_strategy(CreationMode::Easy, spy.clone());
  // order is kept, only the implementation changes
  assert_eq!(factory.supported_modes()[0], CreationMode::Easy);
  let ctx = GenerationContext::new(CreationMode::Easy, "u1", json!({"ok": true}));
  let result = factory.generate(&ctx, &mut rng()).unwrap();
  assert_eq!(result.story.title.as_deref(), Some("Spy"));
  assert_eq!(spy.later_phase_calls(), 5);
}

#[test]
fn template_story_records_template_id() {
  let ctx = GenerationContext::new(CreationMode::Template,
                                   "u1",
                                   json!({
                                     "templateId": "tpl-1",
                                     "template": {
                                       "id": "tpl-1",
                                       "name": "Dragon Day",
                                       "genre": "fantasy",
                                       "characters": [{"name": "Zog", "role": "main"}],
                                       "settings": {"location": "Castle", "timePeriod": "medieval"}
                                     },
                                     "childName": "Ana"
                                   }));
  let result = TemplateModeStrategy.generate_story(&ctx, &mut rng()).unwrap();
  assert!(result.is_valid());
  assert_eq!(result.story.template_id.as_deref(), Some("tpl-1"));
  let metadata = result.story.metadata.unwrap();
  assert_eq!(metadata["characters"][0]["name"], "Ana");
  assert!(result.story.prompt.unwrap().contains("The hero is Ana."));
}

#[test]
fn seeded_titles_are_reproducible() {
  let raw = json!({"difficulty": "medium", "genre": "ocean", "characterName": "Lu"});
  let ctx = GenerationContext::new(CreationMode::Easy, "u1", raw);
  let a = EasyModeStrategy.generate_story(&ctx, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
  let b = EasyModeStrategy.generate_story(&ctx, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
  assert_eq!(a.story.title, b.story.title);
}
