//! Markdown flattening for terminal display.
//!
//! The renderer is an opaque capability: string in, laid-out text out.
//! Block structure survives (headings, lists, code blocks); inline markup
//! is reduced to plain text with code spans kept in backticks.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// Flattens markdown to text suitable for a terminal log.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(text, options);

    let mut out = String::new();
    let mut in_code_block = false;
    let mut link_dest: Option<String> = None;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { .. }) => ensure_blank_line(&mut out),
            Event::End(TagEnd::Heading(_)) => out.push('\n'),
            Event::Start(Tag::Paragraph) => ensure_blank_line(&mut out),
            Event::End(TagEnd::Paragraph) => out.push('\n'),
            Event::Start(Tag::CodeBlock(kind)) => {
                ensure_blank_line(&mut out);
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        out.push_str(&format!("    [{}]\n", lang));
                    }
                }
                in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
            }
            Event::Start(Tag::Item) => {
                ensure_line_start(&mut out);
                out.push_str("  • ");
            }
            Event::End(TagEnd::Item) => ensure_line_start(&mut out),
            Event::Start(Tag::Link { dest_url, .. }) => {
                link_dest = Some(dest_url.to_string());
            }
            Event::End(TagEnd::Link) => {
                if let Some(dest) = link_dest.take() {
                    out.push_str(&format!(" ({})", dest));
                }
            }
            Event::Text(t) => {
                if in_code_block {
                    for line in t.lines() {
                        out.push_str("    ");
                        out.push_str(line);
                        out.push('\n');
                    }
                } else {
                    out.push_str(&t);
                }
            }
            Event::Code(t) => {
                out.push('`');
                out.push_str(&t);
                out.push('`');
            }
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::Rule => {
                ensure_line_start(&mut out);
                out.push_str("────────\n");
            }
            _ => {}
        }
    }

    out.trim().to_string()
}

fn ensure_line_start(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn ensure_blank_line(out: &mut String) {
    ensure_line_start(out);
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push('\n');
    }
}
