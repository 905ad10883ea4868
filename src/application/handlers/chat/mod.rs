//! Chat handlers.

mod send_chat_message;

pub use send_chat_message::{
    ChatHandlerConfig, SendChatMessageCommand, SendChatMessageHandler, SendChatMessageResult,
    DEFAULT_MAX_MESSAGE_CHARS,
};
