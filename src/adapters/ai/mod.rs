//! Generation Client Adapters.
//!
//! Implementations of the GenerationClient port.
//!
//! ## Available Adapters
//!
//! - `OpenAIGenerationClient` - OpenAI-compatible chat completions
//! - `MockGenerationClient` - Configurable mock for testing and offline runs

mod mock_provider;
mod openai_provider;

pub use mock_provider::{MockError, MockGenerationClient, MockResponse, MAX_RECORDED_CALLS};
pub use openai_provider::{
    OpenAIConfig, OpenAIGenerationClient, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL,
};
