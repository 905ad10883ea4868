//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Generation clients (OpenAI-compatible, mock)
//! - `storage` - Session stores (in-memory)
//! - `http` - Axum routes for the chat API

pub mod ai;
pub mod http;
pub mod storage;
