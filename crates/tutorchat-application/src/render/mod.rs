//! Message rendering dispatch.
//!
//! Bot content is inspected in a fixed order: diagram block, then quiz
//! text, then plain markdown. User content is always rendered literally.

pub mod diagram;
pub mod markdown;

pub use diagram::{DiagramRenderer, PanelDiagramRenderer, ensure_mindmap_registered};
pub use markdown::render_markdown;

use tutorchat_core::diagram::extract_diagram_block;
use tutorchat_core::quiz::parse_quiz;
use tutorchat_core::session::{ChatMessage, MessageRole};

use crate::view::{MessageBody, QuizCard, RenderedMessage};

/// Renders a message for display.
pub fn render_message(message: &ChatMessage, diagrams: &dyn DiagramRenderer) -> RenderedMessage {
    let body = match message.role {
        MessageRole::Assistant => render_bot_content(&message.content, diagrams),
        // User and system text is never interpreted as markup
        _ => MessageBody::Literal(message.content.clone()),
    };
    RenderedMessage {
        role: message.role,
        body,
        image_mime: message.image.as_ref().map(|i| i.mime.clone()),
        timestamp: message.timestamp.clone(),
    }
}

/// Decides the display form of bot content.
pub fn render_bot_content(content: &str, diagrams: &dyn DiagramRenderer) -> MessageBody {
    if let Some(block) = extract_diagram_block(content) {
        let panel = match diagrams.render(&block.source) {
            Ok(panel) => panel,
            Err(err) => {
                tracing::warn!("[Renderer] diagram draw failed, showing source: {}", err);
                preformat(&block.source)
            }
        };
        let summary = if block.summary.is_empty() {
            None
        } else {
            Some(render_markdown(&block.summary))
        };
        return MessageBody::Diagram { panel, summary };
    }

    let records = parse_quiz(content);
    if !records.is_empty() {
        let cards = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| QuizCard {
                index,
                record,
                revealed: false,
            })
            .collect();
        return MessageBody::QuizCards(cards);
    }

    MessageBody::Markdown(render_markdown(content))
}

/// Raw diagram source as preformatted text.
fn preformat(source: &str) -> String {
    source
        .lines()
        .map(|l| format!("    {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}
