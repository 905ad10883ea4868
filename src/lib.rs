//! Radio Script Studio - Conversational radio script writer
//!
//! A chat service that walks a radio host through topic, duration and tone,
//! drafts a program script with a language model, and revises it until the
//! host confirms.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
