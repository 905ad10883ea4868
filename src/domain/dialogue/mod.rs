//! Dialogue module - The radio script workflow.
//!
//! A session moves through a fixed sequence of stages (topic, duration,
//! tone), gets a generated draft, and is either finalized or revised.
//!
//! # Components
//!
//! - [`Stage`] - workflow stages and their legal transitions
//! - [`HistoryWindow`] - bounded turn buffer fed to generation calls
//! - [`Session`] - per-user aggregate
//! - [`PromptBuilder`] - deterministic request assembly
//! - [`StageTransitionEngine`] - the state machine, free of I/O

mod engine;
mod errors;
mod history;
mod prompt;
mod session;
mod stage;

pub use engine::{
    StageTransitionConfig, StageTransitionEngine, Step, DEFAULT_CONFIRMATION_KEYWORD,
    DURATION_PROMPT, TONE_PROMPT, TOPIC_PROMPT,
};
pub use errors::DialogueError;
pub use history::{HistoryWindow, Turn, TurnRole, DEFAULT_MAX_HISTORY};
pub use prompt::{PromptBuilder, PromptConfig, DEFAULT_PERSONA};
pub use session::{ScriptFields, Session};
pub use stage::Stage;
