//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the dialogue domain and the outside world. Adapters implement these ports.
//!
//! - `GenerationClient` - The external text-generation service
//! - `SessionStore` - Keyed per-session state with an exclusive section per key

mod generation_client;
mod session_store;

pub use generation_client::{
    FinishReason, GenerationClient, GenerationError, GenerationRequest, GenerationResponse,
    Message, MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use session_store::{SessionGuard, SessionMutator, SessionStore, SessionStoreError};
