//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `RADIO_SCRIPT` prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use radio_script_studio::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Listening on {:?}", config.server.socket_addr());
//! ```

mod ai;
mod dialogue;
mod error;
mod server;

pub use ai::{AiConfig, AiProvider};
pub use dialogue::DialogueConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults; only the OpenAI key is required, and only when
/// the provider is `openai`. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (bind address, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Generation provider configuration
    #[serde(default)]
    pub ai: AiConfig,

    /// Dialogue behavior (sampling, history, limits)
    #[serde(default)]
    pub dialogue: DialogueConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `RADIO_SCRIPT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `RADIO_SCRIPT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `RADIO_SCRIPT__AI__OPENAI_API_KEY=...` -> `ai.openai_api_key = ...`
    /// - `RADIO_SCRIPT__DIALOGUE__MAX_HISTORY=12` -> `dialogue.max_history = 12`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("RADIO_SCRIPT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Besides per-section checks, the HTTP request deadline must outlast the
    /// generation deadline so a slow provider surfaces as a generation failure.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.dialogue.validate()?;

        if self.server.request_timeout_secs <= self.dialogue.generation_timeout_secs {
            return Err(ValidationError::RequestTimeoutTooShort {
                request_secs: self.server.request_timeout_secs,
                generation_secs: self.dialogue.generation_timeout_secs,
            });
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
