//! In-memory stores shared by the unit tests.

use crate::cache::FastStore;
use askboard_core::{
    normalize_tag_names, AskError, AskResult, Comment, CommentId, CounterKind, NewQuestion,
    Question, QuestionCounters, QuestionId, QuestionUpdate, Tag, TagId,
};
use askboard_repository::{CounterRepository, QuestionRepository};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Expiring key/value map driven by the tokio clock.
#[derive(Default)]
pub struct InMemoryFastStore {
    entries: Mutex<HashMap<String, Entry>>,
    failing: AtomicBool,
}

impl InMemoryFastStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail as unavailable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Drops every key.
    pub fn flush(&self) {
        self.entries.lock().clear();
    }

    /// Reads a live value without going through the trait.
    pub fn value(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone())
    }

    /// Remaining lifetime of a live key.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.expires_at)
            .map(|at| at - now)
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
    }

    fn check(&self) -> AskResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AskError::fast_unavailable("connection refused"));
        }
        Ok(())
    }

    fn purge(entries: &mut HashMap<String, Entry>, key: &str) {
        let now = Instant::now();
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
    }
}

#[async_trait]
impl FastStore for InMemoryFastStore {
    async fn get(&self, key: &str) -> AskResult<Option<String>> {
        self.check()?;
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AskResult<()> {
        self.check()?;
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> AskResult<bool> {
        self.check()?;
        let mut entries = self.entries.lock();
        Self::purge(&mut entries, key);
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(true)
    }

    async fn incr(&self, key: &str) -> AskResult<i64> {
        self.incr_by(key, 1).await
    }

    async fn incr_by(&self, key: &str, delta: i64) -> AskResult<i64> {
        self.check()?;
        let mut entries = self.entries.lock();
        Self::purge(&mut entries, key);
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: "0".to_string(),
            expires_at: None,
        });
        let next = entry
            .value
            .parse::<i64>()
            .map_err(|_| AskError::fast_unavailable("value is not an integer"))?
            + delta;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AskResult<()> {
        self.check()?;
        if let Some(entry) = self.entries.lock().get_mut(key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> AskResult<bool> {
        self.check()?;
        Ok(self.value(key).is_some())
    }

    async fn del(&self, key: &str) -> AskResult<()> {
        self.check()?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

struct StoredQuestion {
    question: Question,
    counters: QuestionCounters,
    tags: Vec<Tag>,
    comments: Vec<Comment>,
    likes: usize,
}

/// Durable store fake implementing both repository traits.
#[derive(Default)]
pub struct InMemoryDurableStore {
    questions: Mutex<HashMap<QuestionId, StoredQuestion>>,
    next_id: AtomicUsize,
    failing: AtomicBool,
    checkpoints: Mutex<Vec<(QuestionId, CounterKind, i64)>>,
    increments: AtomicUsize,
    recent_reads: AtomicUsize,
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding one question with the given counts.
    pub fn with_question(id: i64, view_count: i64, like_count: i64) -> Self {
        let store = Self::new();
        store.seed(id, view_count, like_count);
        store
    }

    pub fn seed(&self, id: i64, view_count: i64, like_count: i64) {
        let id = QuestionId(id);
        let now = Utc::now();
        self.questions.lock().insert(
            id,
            StoredQuestion {
                question: Question {
                    id,
                    title: format!("Question {id}"),
                    content: "How does this work?".to_string(),
                    created_at: now,
                    updated_at: now,
                },
                counters: QuestionCounters {
                    question_id: id,
                    view_count,
                    like_count,
                },
                tags: Vec::new(),
                comments: Vec::new(),
                likes: 0,
            },
        );
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn counters(&self, id: i64) -> Option<QuestionCounters> {
        self.questions.lock().get(&QuestionId(id)).map(|q| q.counters)
    }

    pub fn likes_recorded(&self, id: i64) -> usize {
        self.questions.lock().get(&QuestionId(id)).map_or(0, |q| q.likes)
    }

    /// Every checkpoint write, in call order.
    pub fn checkpoints(&self) -> Vec<(QuestionId, CounterKind, i64)> {
        self.checkpoints.lock().clone()
    }

    /// Number of direct `+ 1` increments.
    pub fn increments(&self) -> usize {
        self.increments.load(Ordering::SeqCst)
    }

    /// Number of recent-list queries served.
    pub fn recent_reads(&self) -> usize {
        self.recent_reads.load(Ordering::SeqCst)
    }

    fn check(&self) -> AskResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AskError::durable_unavailable("connection refused"));
        }
        Ok(())
    }

    fn next_id(&self) -> i64 {
        i64::try_from(self.next_id.fetch_add(1, Ordering::SeqCst) + 1_000).unwrap_or(i64::MAX)
    }

    fn tags_for(&self, names: &[String]) -> Vec<Tag> {
        normalize_tag_names(names)
            .into_iter()
            .enumerate()
            .map(|(i, name)| Tag {
                id: TagId(i64::try_from(i).unwrap_or_default() + 1),
                name,
            })
            .collect()
    }
}

#[async_trait]
impl CounterRepository for InMemoryDurableStore {
    async fn find_counters(&self, id: QuestionId) -> AskResult<Option<QuestionCounters>> {
        self.check()?;
        Ok(self.questions.lock().get(&id).map(|q| q.counters))
    }

    async fn increment_counter(&self, id: QuestionId, kind: CounterKind) -> AskResult<bool> {
        self.check()?;
        let mut questions = self.questions.lock();
        let Some(stored) = questions.get_mut(&id) else {
            return Ok(false);
        };
        let value = stored.counters.get(kind) + 1;
        stored.counters.set(kind, value);
        self.increments.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn checkpoint_counter(
        &self,
        id: QuestionId,
        kind: CounterKind,
        value: i64,
    ) -> AskResult<()> {
        self.check()?;
        self.checkpoints.lock().push((id, kind, value));
        if let Some(stored) = self.questions.lock().get_mut(&id) {
            let current = stored.counters.get(kind);
            stored.counters.set(kind, current.max(value));
        }
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryDurableStore {
    async fn find_by_id(&self, id: QuestionId) -> AskResult<Option<Question>> {
        self.check()?;
        Ok(self.questions.lock().get(&id).map(|q| q.question.clone()))
    }

    async fn exists(&self, id: QuestionId) -> AskResult<bool> {
        self.check()?;
        Ok(self.questions.lock().contains_key(&id))
    }

    async fn find_recent(&self, limit: u32) -> AskResult<Vec<Question>> {
        self.check()?;
        self.recent_reads.fetch_add(1, Ordering::SeqCst);
        let mut questions: Vec<Question> = self
            .questions
            .lock()
            .values()
            .map(|q| q.question.clone())
            .collect();
        questions.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        questions.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(questions)
    }

    async fn find_tags(&self, id: QuestionId) -> AskResult<Vec<Tag>> {
        self.check()?;
        Ok(self
            .questions
            .lock()
            .get(&id)
            .map(|q| q.tags.clone())
            .unwrap_or_default())
    }

    async fn find_comments(&self, id: QuestionId) -> AskResult<Vec<Comment>> {
        self.check()?;
        Ok(self
            .questions
            .lock()
            .get(&id)
            .map(|q| q.comments.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn create(&self, question: &NewQuestion) -> AskResult<QuestionId> {
        self.check()?;
        let id = QuestionId(self.next_id());
        let now = Utc::now();
        let tags = self.tags_for(&question.tag_names);
        self.questions.lock().insert(
            id,
            StoredQuestion {
                question: Question {
                    id,
                    title: question.title.clone(),
                    content: question.content.clone(),
                    created_at: now,
                    updated_at: now,
                },
                counters: QuestionCounters::zero(id),
                tags,
                comments: Vec::new(),
                likes: 0,
            },
        );
        Ok(id)
    }

    async fn update(&self, id: QuestionId, update: &QuestionUpdate) -> AskResult<bool> {
        self.check()?;
        let tags = update.tag_names.as_deref().map(|names| self.tags_for(names));
        let mut questions = self.questions.lock();
        let Some(stored) = questions.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(title) = &update.title {
            stored.question.title = title.clone();
        }
        if let Some(content) = &update.content {
            stored.question.content = content.clone();
        }
        if let Some(tags) = tags {
            stored.tags = tags;
        }
        stored.question.updated_at = Utc::now();
        Ok(true)
    }

    async fn add_comment(&self, id: QuestionId, content: &str) -> AskResult<Comment> {
        self.check()?;
        let comment_id = CommentId(self.next_id());
        let mut questions = self.questions.lock();
        let stored = questions
            .get_mut(&id)
            .ok_or_else(|| AskError::durable_unavailable("foreign key constraint fails"))?;
        let comment = Comment {
            id: comment_id,
            question_id: id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        stored.comments.push(comment.clone());
        Ok(comment)
    }

    async fn record_like(&self, id: QuestionId) -> AskResult<()> {
        self.check()?;
        let mut questions = self.questions.lock();
        let stored = questions
            .get_mut(&id)
            .ok_or_else(|| AskError::durable_unavailable("foreign key constraint fails"))?;
        stored.likes += 1;
        Ok(())
    }
}
