//! Crate `story-flow`: protocolo de continuación de historias interactivas
//!
//! Este crate coordina el colaborador de generación (`GenerationBackend`) y
//! la persistencia (`story_domain::StoryRepository`) para avanzar una
//! historia segmento a segmento:
//!
//! - `StoryReader`: sesión de lectura con estados
//!   `AwaitingChoice -> Generating -> {SegmentReady | EndingReady | Failed}`.
//!   El puntero sólo avanza cuando una recarga confirma el nuevo segmento.
//! - `IllustrationDispatcher`: ilustraciones en segundo plano que nunca
//!   bloquean la narración.
//! - `StallRecovery`: sondeo mientras la historia no tiene segmentos.
//! - `StoryService`: creación de historias (pipeline + primer segmento).
//!
//! Ejemplo rápido:
//! ```rust,no_run
//! use std::sync::Arc;
//! use story_domain::InMemoryStoryRepository;
//! use story_flow::{Collaborators, ContinuationConfig, ScriptedBackend, StoryService, TokioClock};
//! use story_generation::StrategyFactory;
//!
//! let collaborators = Collaborators::new(Arc::new(InMemoryStoryRepository::new()),
//!                                        Arc::new(ScriptedBackend::new()),
//!                                        Arc::new(TokioClock),
//!                                        ContinuationConfig::default());
//! let service = StoryService::new(StrategyFactory::default(), collaborators);
//! ```
pub mod backend;
pub mod choice;
pub mod clock;
pub mod config;
pub mod errors;
pub mod illustration;
pub mod reader;
pub mod recovery;
pub mod service;
pub mod stubs;

pub use backend::*;
pub use choice::{resolve_choice_index, resolve_selected_choice};
pub use clock::{Clock, TokioClock};
pub use config::ContinuationConfig;
pub use errors::*;
pub use illustration::{illustration_prompt, IllustrationDispatcher, IllustrationHandle};
pub use reader::{Collaborators, ContinuationOutcome, ReaderEvent, ReaderState, StoryReader};
pub use recovery::{StallRecovery, Visibility};
pub use service::{CreationOutcome, StoryService};
pub use stubs::ScriptedBackend;
