//! Data transfer objects for the chat endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ErrorCode;

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /chat`.
///
/// A missing `message` decodes as empty and is rejected by validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Client-chosen session key; falls back to the `x-session-id` header.
    #[serde(default)]
    pub session_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

/// Reply to `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session_id: String,
}

/// Liveness body for `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, message)
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GenerationFailed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod request {
        use super::*;

        #[test]
        fn decodes_message_only() {
            let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
            assert_eq!(req.message, "hi");
            assert!(req.session_id.is_none());
        }

        #[test]
        fn missing_message_decodes_as_empty() {
            let req: ChatRequest = serde_json::from_str(r#"{"session_id":"abc"}"#).unwrap();
            assert_eq!(req.message, "");
            assert_eq!(req.session_id.as_deref(), Some("abc"));
        }
    }

    mod responses {
        use super::*;

        #[test]
        fn health_serializes_status_ok() {
            let json = serde_json::to_value(HealthResponse::ok()).unwrap();
            assert_eq!(json, serde_json::json!({"status": "ok"}));
        }

        #[test]
        fn error_omits_empty_details() {
            let json = serde_json::to_value(ErrorResponse::bad_request("nope")).unwrap();
            assert_eq!(
                json,
                serde_json::json!({"code": "VALIDATION_FAILED", "message": "nope"})
            );
        }

        #[test]
        fn error_codes_follow_constructor() {
            assert_eq!(ErrorResponse::invalid_state("x").code, "INVALID_STATE");
            assert_eq!(ErrorResponse::generation_failed("x").code, "GENERATION_FAILED");
            assert_eq!(ErrorResponse::internal("x").code, "INTERNAL_ERROR");
        }

        #[test]
        fn details_are_included_when_set() {
            let err = ErrorResponse::bad_request("bad")
                .with_details(serde_json::json!({"field": "message"}));
            assert_eq!(err.details.unwrap()["field"], "message");
        }
    }
}
