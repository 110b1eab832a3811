//! View capability abstraction.
//!
//! The controller never touches a terminal directly; it talks to a
//! [`ChatView`]. The readline binary provides the real implementation,
//! tests substitute a fake that records calls.

use tutorchat_core::quiz::QuestionRecord;
use tutorchat_core::session::MessageRole;

/// One quiz card in a rendered bot message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizCard {
    /// Zero-based position within the reply.
    pub index: usize,
    /// The parsed question.
    pub record: QuestionRecord,
    /// Whether the answer/explanation panel is shown. Default hidden.
    pub revealed: bool,
}

/// The display form of a message body, decided by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Markdown already flattened to terminal text.
    Markdown(String),
    /// Literal text, never interpreted as markup.
    Literal(String),
    /// A drawn (or fallen-back) diagram panel plus optional rendered summary.
    Diagram {
        panel: String,
        summary: Option<String>,
    },
    /// Structured quiz cards.
    QuizCards(Vec<QuizCard>),
    /// The detail panel of one quiz card, appended when the user reveals it.
    QuizDetail {
        index: usize,
        answer: String,
        explanation: String,
    },
}

/// A message ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Who the bubble belongs to.
    pub role: MessageRole,
    /// The rendered body.
    pub body: MessageBody,
    /// MIME type of an attached image, shown as an inline marker.
    pub image_mime: Option<String>,
    /// Creation timestamp (ISO 8601 format).
    pub timestamp: String,
}

/// Capabilities the controller needs from a display surface.
pub trait ChatView {
    /// Appends a message to the log and scrolls to the bottom.
    fn append(&mut self, message: &RenderedMessage);

    /// Shows or hides the loading indicator; while loading the send control
    /// is disabled.
    fn set_loading(&mut self, loading: bool);

    /// Reports a validation problem to the user. No network call follows.
    fn alert(&mut self, text: &str);

    /// Restores the log to its initial welcome state.
    fn reset_log(&mut self);
}
