//! Fenced diagram block extraction.
//!
//! Bot replies from the knowledge-graph agent embed a mermaid description in
//! a fenced code block, optionally surrounded by prose. Extraction is pure
//! text work; actually drawing the diagram is the renderer's concern.

use std::sync::OnceLock;

use regex::Regex;

/// A diagram description split out of a bot reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    /// The fenced block body, trimmed.
    pub source: String,
    /// Whatever text surrounded the block, trimmed. May be empty.
    pub summary: String,
}

fn block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)```mermaid(.*?)```").expect("diagram block pattern"))
}

/// Finds the first ```mermaid fenced block in `text`.
///
/// Only the first block is considered; the remaining text (before and after
/// the block) becomes the summary.
pub fn extract_diagram_block(text: &str) -> Option<DiagramBlock> {
    let caps = block_re().captures(text)?;
    let whole = caps.get(0)?;
    let source = caps.get(1)?.as_str().trim().to_string();
    let summary = format!("{}{}", &text[..whole.start()], &text[whole.end()..])
        .trim()
        .to_string();
    Some(DiagramBlock { source, summary })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_block() {
        assert!(extract_diagram_block("普通的回答，没有图。").is_none());
        assert!(extract_diagram_block("```python\nprint(1)\n```").is_none());
    }

    #[test]
    fn test_block_with_summary() {
        let text = "这是知识图谱：\n```mermaid\nmindmap\n  root((实践))\n```\n以上是总结。";
        let block = extract_diagram_block(text).unwrap();
        assert_eq!(block.source, "mindmap\n  root((实践))");
        assert_eq!(block.summary, "这是知识图谱：\n\n以上是总结。");
    }

    #[test]
    fn test_block_only_has_empty_summary() {
        let text = "```mermaid\ngraph TD\nA-->B\n```";
        let block = extract_diagram_block(text).unwrap();
        assert_eq!(block.source, "graph TD\nA-->B");
        assert!(block.summary.is_empty());
    }

    #[test]
    fn test_case_insensitive_fence_tag() {
        let block = extract_diagram_block("```Mermaid\ngraph LR\n```").unwrap();
        assert_eq!(block.source, "graph LR");
    }
}
