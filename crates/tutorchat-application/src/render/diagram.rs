//! Diagram rendering seam.
//!
//! Drawing is behind a trait so the dispatch logic can be tested with a
//! failing renderer. The built-in renderer draws a framed panel around the
//! diagram source with the recognized diagram type in the header; callers
//! fall back to preformatted raw source when drawing fails.

use std::sync::OnceLock;

use tutorchat_core::error::{ChatClientError, Result};

/// Diagram types the renderer understands out of the box.
const CORE_DIAGRAM_TYPES: &[&str] = &[
    "flowchart",
    "graph",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "pie",
];

/// Mindmap support ships as an extension; it must be registered before the
/// first mindmap is drawn.
static MINDMAP_REGISTERED: OnceLock<bool> = OnceLock::new();

/// Registers the mindmap extension. Idempotent: duplicate calls are no-ops,
/// so call sites do not need a guard.
pub fn ensure_mindmap_registered() {
    let _ = MINDMAP_REGISTERED.set(true);
}

fn mindmap_registered() -> bool {
    MINDMAP_REGISTERED.get().copied().unwrap_or(false)
}

/// Draws a diagram description into displayable text.
pub trait DiagramRenderer: Send + Sync {
    /// Renders `source` or fails; the caller handles the fallback.
    fn render(&self, source: &str) -> Result<String>;
}

/// The built-in renderer: a framed panel labelled with the diagram type.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanelDiagramRenderer;

impl DiagramRenderer for PanelDiagramRenderer {
    fn render(&self, source: &str) -> Result<String> {
        let kind = diagram_kind(source)
            .ok_or_else(|| ChatClientError::internal("unrecognized diagram header"))?;
        if kind == "mindmap" && !mindmap_registered() {
            return Err(ChatClientError::internal("mindmap support not registered"));
        }

        let width = source
            .lines()
            .map(display_width)
            .max()
            .unwrap_or(0)
            .max(display_width(kind) + 2);
        let mut panel = format!("┌─ {} {}┐\n", kind, "─".repeat(width - display_width(kind) - 1));
        for line in source.lines() {
            panel.push_str(&format!(
                "│ {}{} │\n",
                line,
                " ".repeat(width - display_width(line))
            ));
        }
        panel.push_str(&format!("└{}┘", "─".repeat(width + 2)));
        Ok(panel)
    }
}

/// Recognizes the diagram type from the first non-empty source line.
pub fn diagram_kind(source: &str) -> Option<&'static str> {
    let first = source.lines().find(|l| !l.trim().is_empty())?;
    let word = first.trim().split_whitespace().next()?;
    if word == "mindmap" {
        return Some("mindmap");
    }
    CORE_DIAGRAM_TYPES
        .iter()
        .find(|&&t| t == word || word.starts_with(&format!("{}-", t)))
        .copied()
}

/// Rough display width: wide (CJK and fullwidth) characters count double.
fn display_width(s: &str) -> usize {
    s.chars()
        .map(|c| {
            let c = c as u32;
            if (0x1100..0x1160).contains(&c)
                || (0x2E80..0xA4D0).contains(&c)
                || (0xAC00..0xD7A4).contains(&c)
                || (0xF900..0xFB00).contains(&c)
                || (0xFF00..0xFF61).contains(&c)
                || (0xFFE0..0xFFE7).contains(&c)
            {
                2
            } else {
                1
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_is_recognized() {
        assert_eq!(diagram_kind("graph TD\nA-->B"), Some("graph"));
        assert_eq!(diagram_kind("flowchart LR\nA-->B"), Some("flowchart"));
    }

    #[test]
    fn test_unknown_header_fails_render() {
        let err = PanelDiagramRenderer.render("not a diagram at all").unwrap_err();
        assert!(matches!(err, ChatClientError::Internal(_)));
    }

    #[test]
    fn test_mindmap_requires_registration() {
        // Registration is process-global; after ensure the draw succeeds and
        // duplicate registration must not raise.
        ensure_mindmap_registered();
        ensure_mindmap_registered();
        let panel = PanelDiagramRenderer.render("mindmap\n  root((实践))").unwrap();
        assert!(panel.contains("mindmap"));
        assert!(panel.contains("root((实践))"));
    }

    #[test]
    fn test_panel_is_framed() {
        let panel = PanelDiagramRenderer.render("graph TD\nA-->B").unwrap();
        assert!(panel.starts_with("┌─ graph "));
        assert!(panel.ends_with('┘'));
        assert!(panel.contains("│ A-->B"));
    }
}
