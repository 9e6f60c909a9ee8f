//! story-generation: pipeline de generación de historias por modos
//!
//! Define el pipeline de seis fases (`StoryStrategy`) que normaliza la
//! entrada de cada modo de creación (fácil, plantilla, avanzado) en un único
//! prompt para el colaborador de generación de texto, y la fábrica que
//! resuelve la estrategia a partir del `CreationMode`.

pub mod age_mapping;
pub mod context;
pub mod errors;
pub mod factory;
pub mod genres;
pub mod strategies;
pub mod strategy;

pub use age_mapping::{calculate_difficulty, calculate_word_count, difficulty_to_age, Difficulty};
pub use context::{GenerationContext, GenerationResult, ValidationOutcome};
pub use errors::GenerationError;
pub use factory::StrategyFactory;
pub use strategies::{AdvancedModeStrategy, EasyModeStrategy, TemplateModeStrategy};
pub use strategy::{GenerationStrategy, StoryStrategy};
