//! Session and message types.
//!
//! A session here is nothing more than the opaque token the dialogue
//! endpoints hand back; it lives in the controller's UI state for the
//! lifetime of the process and is never persisted.

pub mod message;
pub mod model;

pub use message::{ChatMessage, MessageRole};
pub use model::ChatMode;
