//! HTTP adapter for the chat endpoints.
//!
//! - `dto` - request and response bodies
//! - `handlers` - axum handlers and error mapping
//! - `routes` - router construction

mod dto;
mod handlers;
mod routes;

pub use dto::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse};
pub use handlers::{chat, health, ChatApiError, ChatAppState, SESSION_COOKIE, SESSION_HEADER};
pub use routes::{chat_router, chat_routes};
