//! Axum routes for the chat endpoints.

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{chat, health, ChatAppState};

/// Creates routes for the chat endpoints.
///
/// - GET / - Liveness check
/// - POST /chat - Send a message, receive the next reply
pub fn chat_routes() -> Router<ChatAppState> {
    Router::new()
        .route("/", get(health))
        .route("/chat", post(chat))
}

/// Complete application router with request tracing and a request deadline.
///
/// The deadline should exceed the generation timeout so that a slow
/// generation surfaces as a 500 from the handler rather than a bare 408.
pub fn chat_router(state: ChatAppState, request_timeout: Duration) -> Router {
    chat_routes().with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(request_timeout)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_routes_creates_valid_router() {
        let _routes = chat_routes();
    }
}
