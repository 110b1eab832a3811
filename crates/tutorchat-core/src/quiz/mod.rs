//! Quiz text parsing.
//!
//! Bot replies from the question-generation agent arrive as loosely
//! structured Chinese text. This module heuristically segments such a reply
//! into [`QuestionRecord`]s; callers fall back to plain rendering when no
//! records are produced.
//!
//! # Module Structure
//!
//! - `model`: the parsed question record
//! - `parser`: the pure, line-oriented parser

pub mod model;
pub mod parser;

// Re-export public API
pub use model::QuestionRecord;
pub use parser::parse_quiz;
