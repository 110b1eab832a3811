//! Line-oriented quiz parser.
//!
//! The parser is a pure function: text in, records out. It never touches the
//! view or the network, which keeps it directly unit-testable.

use std::sync::OnceLock;

use regex::Regex;

use super::model::QuestionRecord;

/// Gate pattern: the text must contain at least one quiz marker phrase
/// before any line scanning happens.
fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"题目\s*\d+|选择题\s*\d+|判断题\s*\d+|简答题\s*\d+|题干\s*[:：]|正确答案\s*[:：]|参考答案\s*[:：]|解析\s*[:：]",
        )
        .expect("quiz marker pattern")
    })
}

/// Question header line, e.g. "题目1：" or "选择题 2".
fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:题目|选择题|判断题|简答题)\s*\d+\s*[:：]?").expect("quiz header pattern")
    })
}

fn stem_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^题干\s*[:：]\s*(.*)$").expect("quiz stem pattern"))
}

/// Option line with a half-width or full-width A-D label and separator.
fn option_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-DＡ-Ｄ]\s*[\.．、]\s*(.*)$").expect("quiz option pattern"))
}

fn option_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-DＡ-Ｄ]\s*[\.．、]\s*").expect("quiz option prefix pattern"))
}

fn answer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:正确?答案|参考答案)\s*[:：]\s*(.*)$").expect("quiz answer pattern")
    })
}

fn explain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:解析|答案解析|解答|讲解)\s*[:：]\s*(.*)$").expect("quiz explain pattern")
    })
}

/// Parses quiz-formatted text into question records.
///
/// Returns an empty vector when the text does not look like a quiz; the
/// caller treats that identically to "not a quiz" and falls back to plain
/// rendering.
pub fn parse_quiz(text: &str) -> Vec<QuestionRecord> {
    if !marker_re().is_match(text) {
        return Vec::new();
    }

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return Vec::new();
    }

    // Indices of lines that start a new question. Without an explicit header
    // the entire text is treated as a single question.
    let mut starts: Vec<usize> = (0..lines.len())
        .filter(|&i| header_re().is_match(lines[i]))
        .collect();
    if starts.is_empty() {
        starts.push(0);
    }
    starts.push(lines.len());

    starts
        .windows(2)
        .filter(|w| w[0] < w[1])
        .map(|w| parse_question(&lines[w[0]..w[1]]))
        .collect()
}

fn parse_question(chunk: &[&str]) -> QuestionRecord {
    let title: String = chunk[0].chars().filter(|c| !c.is_whitespace()).collect();
    let mut stem = String::new();
    let mut options = Vec::new();
    let mut answer = String::new();
    let mut explanation = String::new();

    let mut i = 0;
    while i < chunk.len() {
        let line = chunk[i];

        // Skip the header itself
        if i == 0 && header_re().is_match(line) {
            i += 1;
            continue;
        }

        if let Some(caps) = stem_re().captures(line) {
            stem = caps[1].to_string();
            i += 1;
            continue;
        }
        if option_re().is_match(line) {
            options.push(normalize_option(line));
            i += 1;
            continue;
        }
        if let Some(caps) = answer_re().captures(line) {
            answer = caps[1].to_string();
            i += 1;
            continue;
        }
        if let Some(caps) = explain_re().captures(line) {
            // The explanation may span several lines; collect until the next
            // marker line or question header.
            let mut parts = vec![caps[1].to_string()];
            let mut j = i + 1;
            while j < chunk.len() {
                let next = chunk[j];
                if stem_re().is_match(next)
                    || option_re().is_match(next)
                    || answer_re().is_match(next)
                    || header_re().is_match(next)
                {
                    break;
                }
                parts.push(next.to_string());
                j += 1;
            }
            explanation = parts.join("\n");
            i = j;
            continue;
        }

        i += 1;
    }

    // Without an explicit stem line, fall back to the first body line that is
    // not itself an option, answer, or explanation line.
    if stem.is_empty() {
        stem = chunk
            .iter()
            .skip(1)
            .find(|l| {
                !option_re().is_match(l) && !answer_re().is_match(l) && !explain_re().is_match(l)
            })
            .map(|l| l.to_string())
            .unwrap_or_default();
    }

    QuestionRecord {
        title,
        stem,
        options,
        answer,
        explanation,
    }
}

/// Rewrites an option line as "label. text", converting a full-width label
/// to its half-width equivalent by the fixed code-point offset.
fn normalize_option(line: &str) -> String {
    let label = line.chars().next().map(normalize_label).unwrap_or('A');
    let text = option_prefix_re().replace(line, "");
    format!("{}. {}", label, text)
}

fn normalize_label(c: char) -> char {
    if ('Ａ'..='Ｄ').contains(&c) {
        char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
    } else {
        c
    }
}
