//! Errors produced while advancing a dialogue.

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, SessionId, ValidationError};
use crate::ports::GenerationError;

use super::Stage;

/// Failure of a single message turn.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DialogueError {
    /// The incoming message was rejected before touching the session.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The generation service failed or timed out.
    #[error("generation failed: {cause}")]
    GenerationFailure { cause: GenerationError },

    /// The session's stage and fields disagree; the workflow must restart.
    #[error("invalid session state at stage {stage}: {reason}")]
    InvalidState { stage: Stage, reason: String },

    /// The store has no session under this key.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
}

impl DialogueError {
    pub fn invalid_state(stage: Stage, reason: impl Into<String>) -> Self {
        DialogueError::InvalidState {
            stage,
            reason: reason.into(),
        }
    }

    pub fn generation(cause: GenerationError) -> Self {
        DialogueError::GenerationFailure { cause }
    }

    /// Client-facing code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DialogueError::Validation(_) => ErrorCode::ValidationFailed,
            DialogueError::GenerationFailure { .. } => ErrorCode::GenerationFailed,
            DialogueError::InvalidState { .. } => ErrorCode::InvalidState,
            DialogueError::SessionNotFound(_) => ErrorCode::SessionNotFound,
        }
    }
}

impl From<GenerationError> for DialogueError {
    fn from(cause: GenerationError) -> Self {
        DialogueError::generation(cause)
    }
}
