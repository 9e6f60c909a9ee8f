mod character;
mod creation_mode;
mod domain_stubs;
mod errors;
mod segment;
mod story;
mod story_repository;

pub use character::Character;
pub use creation_mode::CreationMode;
pub use domain_stubs::DomainStubs;
pub use errors::DomainError;
pub use segment::{NewSegment, SegmentChoice, SegmentPatch, StorySegment, CHOICES_PER_SEGMENT};
pub use story::{NewStory, Story};
pub use story_repository::{InMemoryStoryRepository, StoryRepository};
