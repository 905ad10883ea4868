//! Dialogue configuration: prompt sampling, history window, and turn limits.

use serde::Deserialize;
use std::time::Duration;

use crate::application::handlers::chat::{ChatHandlerConfig, DEFAULT_MAX_MESSAGE_CHARS};
use crate::domain::dialogue::{
    PromptConfig, StageTransitionConfig, DEFAULT_CONFIRMATION_KEYWORD, DEFAULT_MAX_HISTORY,
    DEFAULT_PERSONA,
};

use super::error::ValidationError;

/// Dialogue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DialogueConfig {
    /// Sampling temperature passed to the provider
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on completion length
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Turns kept per session
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Substring that finalizes a draft
    #[serde(default = "default_confirmation_keyword")]
    pub confirmation_keyword: String,

    /// System prompt sent with every generation call
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Deadline for a single generation call in seconds
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,

    /// Longest accepted user message, in characters
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Sessions idle for longer than this are dropped, in seconds
    #[serde(default = "default_session_idle_ttl")]
    pub session_idle_ttl_secs: u64,
}

impl DialogueConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_ttl_secs)
    }

    /// How often idle sessions are swept: the TTL, capped at one minute.
    pub fn session_sweep_interval(&self) -> Duration {
        self.session_idle_ttl().min(Duration::from_secs(60))
    }

    pub fn prompt_config(&self) -> PromptConfig {
        PromptConfig {
            persona: self.persona.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }

    pub fn transition_config(&self) -> StageTransitionConfig {
        StageTransitionConfig {
            confirmation_keyword: self.confirmation_keyword.clone(),
        }
    }

    pub fn handler_config(&self) -> ChatHandlerConfig {
        ChatHandlerConfig {
            generation_timeout: self.generation_timeout(),
            max_message_chars: self.max_message_chars,
        }
    }

    /// Validate dialogue configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature(self.temperature));
        }
        if self.max_output_tokens == 0 {
            return Err(ValidationError::InvalidMaxOutputTokens);
        }
        // One exchange is a user turn plus an assistant turn.
        if self.max_history < 2 {
            return Err(ValidationError::InvalidMaxHistory(self.max_history));
        }
        if self.max_message_chars == 0 {
            return Err(ValidationError::InvalidMaxMessageChars);
        }
        if self.confirmation_keyword.trim().is_empty() {
            return Err(ValidationError::BlankConfirmationKeyword);
        }
        if self.persona.trim().is_empty() {
            return Err(ValidationError::BlankPersona);
        }
        if self.generation_timeout_secs == 0 || self.generation_timeout_secs > 600 {
            return Err(ValidationError::InvalidGenerationTimeout);
        }
        if self.session_idle_ttl_secs == 0 {
            return Err(ValidationError::InvalidSessionIdleTtl);
        }
        Ok(())
    }
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            max_history: default_max_history(),
            confirmation_keyword: default_confirmation_keyword(),
            persona: default_persona(),
            generation_timeout_secs: default_generation_timeout(),
            max_message_chars: default_max_message_chars(),
            session_idle_ttl_secs: default_session_idle_ttl(),
        }
    }
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_output_tokens() -> u32 {
    600
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

fn default_confirmation_keyword() -> String {
    DEFAULT_CONFIRMATION_KEYWORD.to_string()
}

fn default_persona() -> String {
    DEFAULT_PERSONA.to_string()
}

fn default_generation_timeout() -> u64 {
    60
}

fn default_max_message_chars() -> usize {
    DEFAULT_MAX_MESSAGE_CHARS
}

fn default_session_idle_ttl() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_domain_defaults() {
        let config = DialogueConfig::default();
        assert_eq!(config.prompt_config(), PromptConfig::default());
        assert_eq!(config.transition_config(), StageTransitionConfig::default());
        assert_eq!(config.max_history, 8);
        assert_eq!(config.generation_timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_handler_config_carries_limits() {
        let config = DialogueConfig {
            generation_timeout_secs: 5,
            max_message_chars: 200,
            ..Default::default()
        };
        let handler = config.handler_config();
        assert_eq!(handler.generation_timeout, Duration::from_secs(5));
        assert_eq!(handler.max_message_chars, 200);
    }

    #[test]
    fn test_validation_temperature_range() {
        let config = DialogueConfig {
            temperature: 2.5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidTemperature(2.5))
        );
    }

    #[test]
    fn test_validation_history_needs_one_exchange() {
        let config = DialogueConfig {
            max_history: 1,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxHistory(1)));
    }

    #[test]
    fn test_validation_blank_keyword() {
        let config = DialogueConfig {
            confirmation_keyword: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::BlankConfirmationKeyword)
        );
    }

    #[test]
    fn test_validation_blank_persona() {
        let config = DialogueConfig {
            persona: String::new(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::BlankPersona));
    }

    #[test]
    fn test_session_idle_ttl_and_sweep_interval() {
        let config = DialogueConfig::default();
        assert_eq!(config.session_idle_ttl(), Duration::from_secs(3600));
        assert_eq!(config.session_sweep_interval(), Duration::from_secs(60));

        let short = DialogueConfig {
            session_idle_ttl_secs: 20,
            ..Default::default()
        };
        assert_eq!(short.session_sweep_interval(), Duration::from_secs(20));
    }

    #[test]
    fn test_validation_zero_session_idle_ttl() {
        let config = DialogueConfig {
            session_idle_ttl_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidSessionIdleTtl));
    }

    #[test]
    fn test_validation_zero_generation_timeout() {
        let config = DialogueConfig {
            generation_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidGenerationTimeout)
        );
    }
}
