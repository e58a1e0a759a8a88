//! Question, tag, and comment records.

use crate::{CommentId, QuestionId, TagId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A question row, without its counter columns.
///
/// Counts are carried separately in [`QuestionCounters`](crate::QuestionCounters)
/// and always read through the counter cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tag attached to one or more questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A comment on a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub question_id: QuestionId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The assembled question detail: question, tags, and comments.
///
/// This is the body stored in the response cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDetail {
    pub question: Question,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Characters of content kept in a list row.
pub const PREVIEW_CHARS: usize = 200;

/// A question as shown in the recent list: content cut to a preview, with tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub question: Question,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl QuestionSummary {
    /// Builds a list row, truncating content to [`PREVIEW_CHARS`].
    #[must_use]
    pub fn new(mut question: Question, tags: Vec<Tag>) -> Self {
        question.content = preview(&question.content);
        Self { question, tags }
    }
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Input for a new question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub title: String,
    pub content: String,
    pub tag_names: Vec<String>,
}

impl NewQuestion {
    /// Returns the tag names trimmed, de-duplicated, and with blanks removed.
    #[must_use]
    pub fn normalized_tags(&self) -> Vec<String> {
        normalize_tag_names(&self.tag_names)
    }
}

/// Partial edit of an existing question. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Replaces the full tag set when present.
    pub tag_names: Option<Vec<String>>,
}

impl QuestionUpdate {
    /// Returns true when the update would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tag_names.is_none()
    }
}

/// Trims, de-duplicates, and drops blank tag names, keeping first-seen order.
#[must_use]
pub fn normalize_tag_names(names: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !tags.iter().any(|t| t == name) {
            tags.push(name.to_string());
        }
    }
    tags
}
