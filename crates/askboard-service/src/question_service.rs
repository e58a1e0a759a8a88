//! Question service trait definition.

use crate::dto::{
    AddCommentRequest, CreateQuestionRequest, QuestionListResponse, QuestionResponse,
    UpdateQuestionRequest,
};
use askboard_core::{AskResult, Comment, Interface, QuestionId};
use async_trait::async_trait;

/// Question service trait.
#[async_trait]
pub trait QuestionService: Interface + Send + Sync {
    /// Gets a question with tags, comments, and current counts.
    ///
    /// Counts one view for `viewer_key` unless it viewed recently. The view
    /// is recorded in the background and may not be reflected in the result.
    async fn get_question(&self, id: QuestionId, viewer_key: &str) -> AskResult<QuestionResponse>;

    /// Lists the most recent questions with tags, previews, and current counts.
    async fn list_questions(&self) -> AskResult<QuestionListResponse>;

    /// Creates a question and its tags.
    async fn create_question(&self, request: CreateQuestionRequest) -> AskResult<QuestionId>;

    /// Edits a question's title, content, or tags.
    async fn update_question(&self, id: QuestionId, request: UpdateQuestionRequest) -> AskResult<()>;

    /// Adds a comment to a question.
    async fn add_comment(&self, id: QuestionId, request: AddCommentRequest) -> AskResult<Comment>;

    /// Likes a question.
    async fn like_question(&self, id: QuestionId) -> AskResult<()>;
}
