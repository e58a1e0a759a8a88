//! MySQL question and counter repository implementation.

use crate::{
    traits::{CounterRepository, QuestionRepository},
    DatabasePoolInterface,
};
use askboard_core::{
    normalize_tag_names, AskError, AskResult, Comment, CommentId, CounterKind, NewQuestion,
    Question, QuestionCounters, QuestionId, QuestionUpdate, Tag, TagId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySql, Transaction};
use std::sync::Arc;
use tracing::{debug, info};

/// MySQL-backed durable store.
#[derive(Clone)]
pub struct MySqlQuestionRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlQuestionRepository {
    /// Creates a new MySQL question repository.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct QuestionRow {
    id: i64,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: QuestionId(row.id),
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CounterRow {
    id: i64,
    view_count: i64,
    like_count: i64,
}

impl From<CounterRow> for QuestionCounters {
    fn from(row: CounterRow) -> Self {
        Self {
            question_id: QuestionId(row.id),
            view_count: row.view_count,
            like_count: row.like_count,
        }
    }
}

#[derive(Debug, FromRow)]
struct TagRow {
    id: i64,
    name: String,
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: i64,
    question_id: i64,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: CommentId(row.id),
            question_id: QuestionId(row.question_id),
            content: row.content,
            created_at: row.created_at,
        }
    }
}

// Column names cannot be bound, so each counter gets its own statement.
const fn increment_sql(kind: CounterKind) -> &'static str {
    match kind {
        CounterKind::Views => "UPDATE questions SET view_count = view_count + 1 WHERE id = ?",
        CounterKind::Likes => "UPDATE questions SET like_count = like_count + 1 WHERE id = ?",
    }
}

const fn checkpoint_sql(kind: CounterKind) -> &'static str {
    match kind {
        CounterKind::Views => {
            "UPDATE questions SET view_count = GREATEST(view_count, ?) WHERE id = ?"
        }
        CounterKind::Likes => {
            "UPDATE questions SET like_count = GREATEST(like_count, ?) WHERE id = ?"
        }
    }
}

fn insert_id(raw: u64) -> AskResult<i64> {
    i64::try_from(raw).map_err(|_| AskError::internal(format!("Insert id out of range: {raw}")))
}

/// Finds or creates each tag and attaches it to the question.
async fn link_tags(
    tx: &mut Transaction<'_, MySql>,
    id: QuestionId,
    names: &[String],
) -> AskResult<()> {
    for name in names {
        // LAST_INSERT_ID(id) makes an existing row report its own id.
        let result = sqlx::query(
            "INSERT INTO tags (name) VALUES (?) ON DUPLICATE KEY UPDATE id = LAST_INSERT_ID(id)",
        )
        .bind(name)
        .execute(tx.as_mut())
        .await?;
        let tag_id = insert_id(result.last_insert_id())?;

        sqlx::query("INSERT IGNORE INTO question_tags (question_id, tag_id) VALUES (?, ?)")
            .bind(id.into_inner())
            .bind(tag_id)
            .execute(tx.as_mut())
            .await?;
    }
    Ok(())
}

#[async_trait]
impl CounterRepository for MySqlQuestionRepository {
    async fn find_counters(&self, id: QuestionId) -> AskResult<Option<QuestionCounters>> {
        let row = sqlx::query_as::<_, CounterRow>(
            "SELECT id, view_count, like_count FROM questions WHERE id = ?",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(QuestionCounters::from))
    }

    async fn increment_counter(&self, id: QuestionId, kind: CounterKind) -> AskResult<bool> {
        debug!("Incrementing {} for question {} in database", kind, id);

        let result = sqlx::query(increment_sql(kind))
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn checkpoint_counter(
        &self,
        id: QuestionId,
        kind: CounterKind,
        value: i64,
    ) -> AskResult<()> {
        debug!("Checkpointing {} = {} for question {}", kind, value, id);

        sqlx::query(checkpoint_sql(kind))
            .bind(value)
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;

        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for MySqlQuestionRepository {
    async fn find_by_id(&self, id: QuestionId) -> AskResult<Option<Question>> {
        debug!("Finding question by id: {}", id);

        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, title, content, created_at, updated_at
            FROM questions
            WHERE id = ?
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Question::from))
    }

    async fn exists(&self, id: QuestionId) -> AskResult<bool> {
        let result: Option<i32> = sqlx::query_scalar("SELECT 1 FROM questions WHERE id = ? LIMIT 1")
            .bind(id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(result.is_some())
    }

    async fn find_recent(&self, limit: u32) -> AskResult<Vec<Question>> {
        debug!("Listing {} most recent questions", limit);

        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, title, content, created_at, updated_at
            FROM questions
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn find_tags(&self, id: QuestionId) -> AskResult<Vec<Tag>> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT t.id, t.name
            FROM tags t
            JOIN question_tags qt ON t.id = qt.tag_id
            WHERE qt.question_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(id.into_inner())
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Tag {
                id: TagId(row.id),
                name: row.name,
            })
            .collect())
    }

    async fn find_comments(&self, id: QuestionId) -> AskResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, question_id, content, created_at
            FROM comments
            WHERE question_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(id.into_inner())
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn create(&self, question: &NewQuestion) -> AskResult<QuestionId> {
        let mut tx = self.pool.inner().begin().await?;

        let result = sqlx::query("INSERT INTO questions (title, content) VALUES (?, ?)")
            .bind(&question.title)
            .bind(&question.content)
            .execute(tx.as_mut())
            .await?;
        let id = QuestionId(insert_id(result.last_insert_id())?);

        link_tags(&mut tx, id, &question.normalized_tags()).await?;
        tx.commit().await?;

        info!("Created question {}", id);
        Ok(id)
    }

    async fn update(&self, id: QuestionId, update: &QuestionUpdate) -> AskResult<bool> {
        let mut tx = self.pool.inner().begin().await?;

        let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM questions WHERE id = ? FOR UPDATE")
            .bind(id.into_inner())
            .fetch_optional(tx.as_mut())
            .await?;
        if locked.is_none() {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE questions
            SET title = COALESCE(?, title),
                content = COALESCE(?, content),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(update.title.as_deref())
        .bind(update.content.as_deref())
        .bind(id.into_inner())
        .execute(tx.as_mut())
        .await?;

        if let Some(names) = &update.tag_names {
            sqlx::query("DELETE FROM question_tags WHERE question_id = ?")
                .bind(id.into_inner())
                .execute(tx.as_mut())
                .await?;
            link_tags(&mut tx, id, &normalize_tag_names(names)).await?;
        }

        tx.commit().await?;

        info!("Updated question {}", id);
        Ok(true)
    }

    async fn add_comment(&self, id: QuestionId, content: &str) -> AskResult<Comment> {
        let result = sqlx::query("INSERT INTO comments (question_id, content) VALUES (?, ?)")
            .bind(id.into_inner())
            .bind(content)
            .execute(self.pool.inner())
            .await?;
        let comment_id = insert_id(result.last_insert_id())?;

        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, question_id, content, created_at FROM comments WHERE id = ?",
        )
        .bind(comment_id)
        .fetch_one(self.pool.inner())
        .await?;

        Ok(Comment::from(row))
    }

    async fn record_like(&self, id: QuestionId) -> AskResult<()> {
        let mut tx = self.pool.inner().begin().await?;

        sqlx::query("INSERT INTO likes (question_id) VALUES (?)")
            .bind(id.into_inner())
            .execute(tx.as_mut())
            .await?;

        tx.commit().await?;

        debug!("Recorded like for question {}", id);
        Ok(())
    }
}
