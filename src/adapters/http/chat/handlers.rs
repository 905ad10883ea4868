//! HTTP handlers for the chat endpoints.
//!
//! These handlers connect Axum routes to the chat use case.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};

use crate::application::handlers::chat::{SendChatMessageCommand, SendChatMessageHandler};
use crate::domain::dialogue::DialogueError;
use crate::domain::foundation::SessionId;

use super::dto::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse};

/// Header carrying the session key when the body has none.
pub const SESSION_HEADER: &str = "x-session-id";

/// Cookie set on every reply so clients that send no key keep their session.
pub const SESSION_COOKIE: &str = "session_id";

const RESTART_NOTICE: &str =
    "This conversation got into an unexpected state, so the workflow was restarted. Send any message to begin again.";

const GENERATION_NOTICE: &str = "The script could not be generated right now. Please try again.";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state for chat handlers.
#[derive(Clone)]
pub struct ChatAppState {
    pub handler: Arc<SendChatMessageHandler>,
}

impl ChatAppState {
    pub fn new(handler: Arc<SendChatMessageHandler>) -> Self {
        Self { handler }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /
// ════════════════════════════════════════════════════════════════════════════════

/// GET / - Liveness check. Touches no session.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse::ok()))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /chat
// ════════════════════════════════════════════════════════════════════════════════

/// POST /chat - Advance the caller's session by one message.
///
/// The reply sets the `session_id` cookie to the session key.
///
/// # Errors
/// - 400 Bad Request: blank message, malformed body or session key, or a
///   session that had to be restarted
/// - 500 Internal Server Error: generation failed or timed out
pub async fn chat(
    State(state): State<ChatAppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ChatApiError> {
    let Json(request) = payload.map_err(|e| ChatApiError::BadRequest(e.body_text()))?;

    let session_id = resolve_session_id(request.session_id.as_deref(), &headers)?;

    let result = state
        .handler
        .handle(SendChatMessageCommand {
            session_id,
            message: request.message,
        })
        .await?;

    let mut response_headers = HeaderMap::new();
    if let Some(cookie) = session_cookie(&result.session_id) {
        response_headers.insert(SET_COOKIE, cookie);
    }

    Ok((
        StatusCode::OK,
        response_headers,
        Json(ChatResponse {
            reply: result.reply,
            session_id: result.session_id.to_string(),
        }),
    ))
}

/// Picks the session key from the body, then the header, then the session
/// cookie, else mints one.
///
/// A malformed body or header key is rejected. A malformed cookie is ignored.
fn resolve_session_id(
    from_body: Option<&str>,
    headers: &HeaderMap,
) -> Result<SessionId, ChatApiError> {
    let from_header = headers
        .get(SESSION_HEADER)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| ChatApiError::BadRequest("Invalid x-session-id header".to_string()))
        })
        .transpose()?;

    match from_body.or(from_header) {
        Some(raw) => raw
            .parse::<SessionId>()
            .map_err(|e| ChatApiError::BadRequest(e.to_string())),
        None => Ok(session_id_from_cookie(headers).unwrap_or_else(SessionId::generate)),
    }
}

fn session_id_from_cookie(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.parse().ok())
}

/// `Set-Cookie` value for `id`, or `None` if the key cannot be a cookie value.
fn session_cookie(id: &SessionId) -> Option<HeaderValue> {
    let cookie_safe = id
        .as_str()
        .chars()
        .all(|c| c.is_ascii_graphic() && !matches!(c, '"' | ',' | ';' | '\\'));
    if !cookie_safe {
        return None;
    }
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        id.as_str()
    ))
    .ok()
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type for chat endpoints.
#[derive(Debug)]
pub enum ChatApiError {
    BadRequest(String),
    /// The session was reset; the detail is logged, not returned.
    InvalidState(String),
    /// The generation call failed; the cause is logged, not returned.
    GenerationFailed(String),
    Internal(String),
}

impl From<DialogueError> for ChatApiError {
    fn from(err: DialogueError) -> Self {
        match err {
            DialogueError::Validation(e) => ChatApiError::BadRequest(e.to_string()),
            DialogueError::InvalidState { .. } => ChatApiError::InvalidState(err.to_string()),
            DialogueError::GenerationFailure { cause } => {
                ChatApiError::GenerationFailed(cause.to_string())
            }
            DialogueError::SessionNotFound(_) => ChatApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ChatApiError::BadRequest(msg) => {
                tracing::debug!("Rejected chat request: {}", msg);
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg))
            }
            ChatApiError::InvalidState(msg) => {
                tracing::warn!("Session restarted: {}", msg);
                (StatusCode::BAD_REQUEST, ErrorResponse::invalid_state(RESTART_NOTICE))
            }
            ChatApiError::GenerationFailed(msg) => {
                tracing::error!("Generation failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::generation_failed(GENERATION_NOTICE),
                )
            }
            ChatApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal("An internal error occurred"),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}
