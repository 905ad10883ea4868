//! Storage Adapters
//!
//! Implementations of the SessionStore port.
//!
//! ## Available Adapters
//!
//! - **InMemorySessionStore** - Process-local sessions with per-session locking
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::InMemorySessionStore;
//!
//! let store = InMemorySessionStore::new(config.dialogue.max_history);
//! ```

mod in_memory_session_store;

pub use in_memory_session_store::InMemorySessionStore;
