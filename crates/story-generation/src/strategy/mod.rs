pub mod helpers;
pub mod trait_strategy;

pub use trait_strategy::{GenerationStrategy, StoryStrategy};
