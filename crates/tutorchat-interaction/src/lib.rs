//! Transport layer for the tutoring chat service.
//!
//! The service exposes four JSON POST endpoints: a stateless `/chat` turn
//! and the session-oriented `/start_dialogue`, `/continue_dialogue` and
//! `/end_dialogue` family. This crate builds the requests, decodes the
//! responses, and maps failures onto `ChatClientError` variants; it never
//! retries and holds no session state of its own.

pub mod chat_api_agent;
mod wire;

pub use chat_api_agent::ChatApiAgent;

use async_trait::async_trait;
use tutorchat_core::error::Result;
use tutorchat_core::image::ImageAttachment;

/// A single reply from the tutoring service.
///
/// `session_id` is present when the service opened or refreshed a session.
/// `character`, `topic` and `turn_count` are only filled by the dialogue
/// endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotReply {
    /// The reply text to render.
    pub response: String,
    /// Session token to use for subsequent turns.
    pub session_id: Option<String>,
    /// Name of the simulated character.
    pub character: Option<String>,
    /// Current dialogue topic.
    pub topic: Option<String>,
    /// Number of turns taken in this session.
    pub turn_count: Option<u32>,
}

/// Capability trait over the remote chat service.
///
/// The controller only sees this trait, which keeps it testable with a fake
/// backend and keeps endpoint selection in one place.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Stateless single turn, optionally carrying an inline image.
    async fn chat(&self, message: &str, image: Option<&ImageAttachment>) -> Result<BotReply>;

    /// Opens a session; the reply carries the new session token.
    async fn start_dialogue(&self, message: &str) -> Result<BotReply>;

    /// Continues an existing session.
    async fn continue_dialogue(&self, session_id: &str, message: &str) -> Result<BotReply>;

    /// Notifies the service that the session is over. Callers treat failures
    /// as best-effort.
    async fn end_dialogue(&self, session_id: &str) -> Result<()>;
}
