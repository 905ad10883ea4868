//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Request timeout ({request_secs}s) must exceed generation timeout ({generation_secs}s)")]
    RequestTimeoutTooShort {
        request_secs: u64,
        generation_secs: u64,
    },

    #[error("Invalid generation timeout")]
    InvalidGenerationTimeout,

    #[error("session_idle_ttl_secs must be greater than zero")]
    InvalidSessionIdleTtl,

    #[error("Temperature must be between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f32),

    #[error("max_output_tokens must be greater than zero")]
    InvalidMaxOutputTokens,

    #[error("max_history must be at least 2, got {0}")]
    InvalidMaxHistory(usize),

    #[error("max_message_chars must be greater than zero")]
    InvalidMaxMessageChars,

    #[error("Confirmation keyword cannot be blank")]
    BlankConfirmationKeyword,

    #[error("Persona cannot be blank")]
    BlankPersona,

    #[error("Invalid AI base URL: {0}")]
    InvalidBaseUrl(String),
}
