//! Parsed question record.

use serde::{Deserialize, Serialize};

/// One question extracted from a quiz-formatted bot reply.
///
/// Every field is best-effort: a malformed or partial question still yields
/// a record with whatever fields were found, the rest left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Header line with whitespace stripped (e.g. "题目1：").
    pub title: String,
    /// The question stem.
    pub stem: String,
    /// Ordered options, normalized to "label. text" with half-width labels.
    pub options: Vec<String>,
    /// The marked answer, verbatim.
    pub answer: String,
    /// Explanation text; continuation lines are joined with newlines.
    pub explanation: String,
}

impl QuestionRecord {
    /// Whether the record carries anything to reveal behind the toggle.
    pub fn has_detail(&self) -> bool {
        !self.answer.trim().is_empty() || !self.explanation.trim().is_empty()
    }
}
