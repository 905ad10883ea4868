//! Application handlers.
//!
//! Command handlers that orchestrate domain operations across ports.

pub mod chat;

pub use chat::{
    ChatHandlerConfig, SendChatMessageCommand, SendChatMessageHandler, SendChatMessageResult,
};
