//! Conversation message types.

use serde::{Deserialize, Serialize};

use crate::image::ImageAttachment;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System-generated message (session notices, etc.).
    System,
}

/// A single message bubble in the conversation log.
///
/// Messages are transient: the log itself lives in the view, and nothing is
/// retained in an addressable history structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Inline image attached by the user, if any.
    pub image: Option<ImageAttachment>,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
}

impl ChatMessage {
    /// Creates a user message, optionally carrying an image attachment.
    pub fn user(content: impl Into<String>, image: Option<ImageAttachment>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            image,
            timestamp: now_timestamp(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            image: None,
            timestamp: now_timestamp(),
        }
    }

    /// Creates a system notice.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            image: None,
            timestamp: now_timestamp(),
        }
    }
}

/// The current time in the ISO 8601 format used for message timestamps.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
