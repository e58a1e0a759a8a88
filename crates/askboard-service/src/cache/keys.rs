//! Fast store key layout.

use askboard_core::{CounterKind, QuestionId};

/// Key of the list-level response cache entry.
pub const QUESTION_LIST: &str = "questions:list";

/// Shadow counter for one question and counter kind.
#[must_use]
pub fn counter(id: QuestionId, kind: CounterKind) -> String {
    format!("counter:{}:{}", id, kind.as_str())
}

/// Dedup marker for one viewer of one question.
#[must_use]
pub fn viewed(id: QuestionId, viewer_key: &str) -> String {
    format!("viewed:{}:{}", id, viewer_key)
}

/// Cached question detail payload.
#[must_use]
pub fn detail(id: QuestionId) -> String {
    format!("detail:{}", id)
}
