//! Question request and response DTOs.

use askboard_core::{
    rules, Comment, NewQuestion, Question, QuestionCounters, QuestionDetail, QuestionId,
    QuestionSummary, QuestionUpdate, Tag,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to create a question.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(
        custom(function = "rules::not_blank", message = "Title is required"),
        length(max = 255, message = "Title cannot exceed 255 characters")
    )]
    pub title: String,

    #[validate(custom(function = "rules::not_blank", message = "Content is required"))]
    pub content: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<CreateQuestionRequest> for NewQuestion {
    fn from(request: CreateQuestionRequest) -> Self {
        Self {
            title: request.title.trim().to_string(),
            content: request.content,
            tag_names: request.tags,
        }
    }
}

/// Request to edit a question. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(
        custom(function = "rules::not_blank", message = "Title cannot be blank"),
        length(max = 255, message = "Title cannot exceed 255 characters")
    )]
    pub title: Option<String>,

    #[validate(custom(function = "rules::not_blank", message = "Content cannot be blank"))]
    pub content: Option<String>,

    /// Replaces the tag set when present.
    pub tags: Option<Vec<String>>,
}

impl From<UpdateQuestionRequest> for QuestionUpdate {
    fn from(request: UpdateQuestionRequest) -> Self {
        Self {
            title: request.title.map(|t| t.trim().to_string()),
            content: request.content,
            tag_names: request.tags,
        }
    }
}

/// Request to comment on a question.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(custom(function = "rules::not_blank", message = "Comment content is required"))]
    pub content: String,
}

/// A question with its current counts.
///
/// `likes_count` and `views_count` repeat `like_count` and `view_count` for
/// older clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: i64,
    pub view_count: i64,
    pub likes_count: i64,
    pub views_count: i64,
}

impl QuestionView {
    /// Renders a question with the given counts under both field names.
    #[must_use]
    pub fn new(question: Question, counters: QuestionCounters) -> Self {
        Self {
            id: question.id,
            title: question.title,
            content: question.content,
            created_at: question.created_at,
            updated_at: question.updated_at,
            like_count: counters.like_count,
            view_count: counters.view_count,
            likes_count: counters.like_count,
            views_count: counters.view_count,
        }
    }
}

/// Question detail response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question: QuestionView,
    pub tags: Vec<Tag>,
    pub comments: Vec<Comment>,
    pub likes: i64,
}

impl QuestionResponse {
    /// Combines a cached detail with freshly read counts.
    #[must_use]
    pub fn from_detail(detail: QuestionDetail, counters: QuestionCounters) -> Self {
        Self {
            question: QuestionView::new(detail.question, counters),
            tags: detail.tags,
            comments: detail.comments,
            likes: counters.like_count,
        }
    }
}

/// One row of the recent list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionListItem {
    pub question: QuestionView,
    pub tags: Vec<Tag>,
}

impl QuestionListItem {
    /// Combines a cached list row with freshly read counts.
    #[must_use]
    pub fn from_summary(summary: QuestionSummary, counters: QuestionCounters) -> Self {
        Self {
            question: QuestionView::new(summary.question, counters),
            tags: summary.tags,
        }
    }
}

/// Recent questions, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionListResponse {
    pub questions: Vec<QuestionListItem>,
}

/// Response to a created question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedQuestionResponse {
    pub id: QuestionId,
}
