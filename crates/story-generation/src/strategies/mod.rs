pub mod advanced;
pub mod easy;
pub mod template;

pub use advanced::AdvancedModeStrategy;
pub use easy::EasyModeStrategy;
pub use template::TemplateModeStrategy;
