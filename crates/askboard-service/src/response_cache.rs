//! Cached question detail and list payloads.
//!
//! Entries hold questions with their tags (and, for details, comments) as of
//! population time. Counts are never stored here; callers read them from the
//! counter cache when serving.

use crate::cache::{keys, FastStore};
use crate::metrics::CounterMetrics;
use askboard_core::{AskResult, QuestionDetail, QuestionId, QuestionSummary};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// JSON cache of assembled payloads: `detail:{id}` per question and one
/// list entry under [`keys::QUESTION_LIST`].
pub struct ResponseCache {
    fast: Arc<dyn FastStore>,
    ttl: Duration,
}

impl ResponseCache {
    /// Creates a response cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(fast: Arc<dyn FastStore>, ttl: Duration) -> Self {
        Self { fast, ttl }
    }

    /// Returns the cached detail, or `None` on a miss.
    ///
    /// A fast store error or an unreadable body is treated as a miss.
    pub async fn get(&self, id: QuestionId) -> Option<QuestionDetail> {
        self.read(&keys::detail(id)).await
    }

    /// Stores a detail with the configured TTL. Best effort.
    pub async fn put(&self, id: QuestionId, detail: &QuestionDetail) {
        self.put_with_ttl(id, detail, self.ttl).await;
    }

    /// Stores a detail with an explicit TTL. Best effort.
    pub async fn put_with_ttl(&self, id: QuestionId, detail: &QuestionDetail, ttl: Duration) {
        self.write(&keys::detail(id), detail, ttl).await;
    }

    /// Returns the cached recent list, or `None` on a miss.
    pub async fn get_list(&self) -> Option<Vec<QuestionSummary>> {
        self.read(keys::QUESTION_LIST).await
    }

    /// Stores the recent list with the configured TTL. Best effort.
    pub async fn put_list(&self, summaries: &[QuestionSummary]) {
        self.write(keys::QUESTION_LIST, summaries, self.ttl).await;
    }

    /// Deletes the detail entry. Deleting an absent entry succeeds.
    pub async fn invalidate(&self, id: QuestionId) -> AskResult<()> {
        self.fast.del(&keys::detail(id)).await
    }

    /// Deletes the list-level entry.
    pub async fn invalidate_list(&self) -> AskResult<()> {
        self.fast.del(keys::QUESTION_LIST).await
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.fast.get(key).await {
            Ok(Some(body)) => match serde_json::from_str::<T>(&body) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Discarding unreadable cache entry '{}': {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Response cache read failed for '{}': {}", key, e);
                CounterMetrics::fast_store_fallback("response_cache_get");
                None
            }
        };

        debug!(
            "Response cache {} for '{}'",
            if value.is_some() { "hit" } else { "miss" },
            key
        );
        CounterMetrics::response_cache_lookup(value.is_some());
        value
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let body = match serde_json::to_string(value) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to serialize '{}' for caching: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.fast.set(key, &body, ttl).await {
            warn!("Failed to cache '{}': {}", key, e);
        }
    }
}
