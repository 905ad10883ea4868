//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine trait)
//! - `dialogue` - Script workflow stages, sessions, prompt assembly and transitions

pub mod dialogue;
pub mod foundation;
