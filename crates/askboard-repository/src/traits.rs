//! Repository trait definitions.

use askboard_core::{
    AskResult, Comment, CounterKind, Interface, NewQuestion, Question, QuestionCounters,
    QuestionId, QuestionUpdate, Tag,
};
use async_trait::async_trait;

/// Durable counter columns of the `questions` table.
///
/// This is the only writer of `view_count` and `like_count`.
#[async_trait]
pub trait CounterRepository: Interface + Send + Sync {
    /// Reads both counters, or `None` if the question does not exist.
    async fn find_counters(&self, id: QuestionId) -> AskResult<Option<QuestionCounters>>;

    /// Adds one to a counter column. Returns false if no row matched.
    async fn increment_counter(&self, id: QuestionId, kind: CounterKind) -> AskResult<bool>;

    /// Writes a checkpoint value into a counter column.
    ///
    /// The stored value never decreases: a checkpoint lower than the current
    /// column is a no-op, so late or reordered checkpoints cannot regress it.
    async fn checkpoint_counter(
        &self,
        id: QuestionId,
        kind: CounterKind,
        value: i64,
    ) -> AskResult<()>;
}

/// Question, tag, comment, and like rows.
#[async_trait]
pub trait QuestionRepository: Interface + Send + Sync {
    /// Finds a question by ID.
    async fn find_by_id(&self, id: QuestionId) -> AskResult<Option<Question>>;

    /// Checks whether a question exists.
    async fn exists(&self, id: QuestionId) -> AskResult<bool>;

    /// Lists the newest questions, at most `limit` of them.
    async fn find_recent(&self, limit: u32) -> AskResult<Vec<Question>>;

    /// Lists the tags attached to a question.
    async fn find_tags(&self, id: QuestionId) -> AskResult<Vec<Tag>>;

    /// Lists the comments on a question, newest first.
    async fn find_comments(&self, id: QuestionId) -> AskResult<Vec<Comment>>;

    /// Inserts a question together with its tags in one transaction.
    async fn create(&self, question: &NewQuestion) -> AskResult<QuestionId>;

    /// Applies a partial update. Returns false if the question does not exist.
    async fn update(&self, id: QuestionId, update: &QuestionUpdate) -> AskResult<bool>;

    /// Inserts a comment and returns the stored row.
    async fn add_comment(&self, id: QuestionId, content: &str) -> AskResult<Comment>;

    /// Records a like row. Counter columns are left to the counter layer.
    async fn record_like(&self, id: QuestionId) -> AskResult<()>;
}
