//! Session Store Port - Interface for keyed per-session dialogue state.
//!
//! Sessions live only as long as the process. Each session carries its own
//! exclusive section so that two messages for the same key never interleave,
//! while different keys proceed independently.

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::domain::dialogue::Session;
use crate::domain::foundation::SessionId;

/// Exclusive access to one session for the duration of a message turn.
///
/// Released on drop, including when the owning task is cancelled.
pub type SessionGuard = OwnedMutexGuard<Session>;

/// Mutation applied to a session under its exclusive section.
pub type SessionMutator = Box<dyn FnOnce(&mut Session) + Send>;

/// Errors that can occur during session store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),
}

/// Port for per-session dialogue state
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns a snapshot of the session, creating a fresh one if the key is new.
    async fn get_or_create(&self, id: &SessionId) -> Session;

    /// Acquires the session's exclusive section, creating the session if needed.
    ///
    /// The guard dereferences to the stored session; assigning through it
    /// commits the new state.
    async fn lock(&self, id: &SessionId) -> SessionGuard;

    /// Applies `mutator` under the exclusive section and returns the result.
    ///
    /// # Errors
    /// Returns `SessionStoreError::NotFound` if the key was never created
    async fn update(
        &self,
        id: &SessionId,
        mutator: SessionMutator,
    ) -> Result<Session, SessionStoreError>;

    /// Replaces the session with a fresh one at the initial stage.
    ///
    /// # Errors
    /// Returns `SessionStoreError::NotFound` if the key was never created
    async fn reset(&self, id: &SessionId) -> Result<Session, SessionStoreError>;

    /// Number of live sessions.
    async fn len(&self) -> usize;

    /// Returns true if no session has been created.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
