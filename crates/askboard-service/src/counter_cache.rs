//! View and like counters shadowed in the fast store.
//!
//! The database column is authoritative. The fast store holds a value per
//! `counter:{id}:{kind}` key that is never behind the last checkpointed
//! value, and is what readers see between checkpoints.
//!
//! Flush policy differs per kind:
//!
//! - views are checkpointed when the post-increment value is a multiple of
//!   [`CounterPolicy::view_checkpoint_interval`]; a failed checkpoint is
//!   logged and dropped,
//! - likes are written through on every increment and a failed write is
//!   returned to the caller.
//!
//! When the fast store is unreachable an increment falls back to a direct
//! `col = col + 1` in the database, so an increment is never silently lost.

use crate::cache::{keys, FastStore};
use crate::metrics::CounterMetrics;
use askboard_config::CountersConfig;
use askboard_core::{AskError, AskResult, CounterKind, QuestionCounters, QuestionId, StoreKind};
use askboard_repository::CounterRepository;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Expiry and checkpoint cadence for shadow counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterPolicy {
    /// Expiry of each shadow counter key.
    pub counter_ttl: Duration,
    /// Views are checkpointed every this many increments.
    pub view_checkpoint_interval: i64,
}

impl Default for CounterPolicy {
    fn default() -> Self {
        Self {
            counter_ttl: Duration::from_secs(24 * 60 * 60),
            view_checkpoint_interval: 5,
        }
    }
}

impl From<&CountersConfig> for CounterPolicy {
    fn from(config: &CountersConfig) -> Self {
        Self {
            counter_ttl: config.counter_ttl(),
            view_checkpoint_interval: i64::try_from(config.view_checkpoint_interval)
                .unwrap_or(i64::MAX)
                .max(1),
        }
    }
}

impl CounterPolicy {
    /// Whether a post-increment view value triggers a checkpoint.
    #[must_use]
    pub const fn is_view_checkpoint(&self, value: i64) -> bool {
        value > 0 && value % self.view_checkpoint_interval == 0
    }
}

/// Where an increment landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOutcome {
    /// Applied to the shadow counter, which now holds this value.
    Shadowed(i64),
    /// The fast store was unavailable and the column was incremented directly.
    Durable,
}

/// Reconciles counters between the fast store and the database.
pub struct CounterCache {
    fast: Arc<dyn FastStore>,
    durable: Arc<dyn CounterRepository>,
    policy: CounterPolicy,
}

impl CounterCache {
    /// Creates a counter cache.
    #[must_use]
    pub fn new(
        fast: Arc<dyn FastStore>,
        durable: Arc<dyn CounterRepository>,
        policy: CounterPolicy,
    ) -> Self {
        Self {
            fast,
            durable,
            policy,
        }
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &CounterPolicy {
        &self.policy
    }

    /// Current value of one counter.
    ///
    /// Served from the fast store when present. Otherwise the database value
    /// is returned and written back so the next read is a hit.
    pub async fn get_count(&self, id: QuestionId, kind: CounterKind) -> AskResult<i64> {
        let key = keys::counter(id, kind);

        match self.fast.get(&key).await {
            Ok(Some(raw)) => match raw.parse::<i64>() {
                Ok(value) => {
                    debug!("Counter hit for '{}': {}", key, value);
                    return Ok(value);
                }
                Err(_) => warn!("Ignoring non-numeric counter '{}': {:?}", key, raw),
            },
            Ok(None) => debug!("Counter miss for '{}'", key),
            Err(e) => {
                warn!("Fast store read failed for '{}', using database: {}", key, e);
                CounterMetrics::fast_store_fallback("get_count");
            }
        }

        let value = self.durable_value(id, kind).await?;

        // Only fills an absent key, so a concurrent increment is never overwritten.
        if let Err(e) = self
            .fast
            .set_if_absent(&key, &value.to_string(), self.policy.counter_ttl)
            .await
        {
            debug!("Counter write-back for '{}' skipped: {}", key, e);
        }

        Ok(value)
    }

    /// Both counters of a question.
    pub async fn get_counters(&self, id: QuestionId) -> AskResult<QuestionCounters> {
        let mut counters = QuestionCounters::zero(id);
        for kind in CounterKind::ALL {
            counters.set(kind, self.get_count(id, kind).await?);
        }
        Ok(counters)
    }

    /// Counts one view, checkpointing on the configured cadence.
    ///
    /// A failed checkpoint is logged and does not fail the call.
    pub async fn increment_view(&self, id: QuestionId) -> AskResult<()> {
        let IncrementOutcome::Shadowed(value) = self.record_increment(id, CounterKind::Views).await?
        else {
            return Ok(());
        };

        if self.policy.is_view_checkpoint(value) {
            if let Err(e) = self.write_through(id, CounterKind::Views, value).await {
                let stale = AskError::StaleWrite(format!(
                    "view checkpoint {} for question {} lost: {}",
                    value, id, e
                ));
                warn!("{}", stale);
                CounterMetrics::checkpoint_dropped(CounterKind::Views);
            }
        }

        Ok(())
    }

    /// Counts one like and writes the new value through to the database.
    pub async fn increment_like(&self, id: QuestionId) -> AskResult<()> {
        match self.record_increment(id, CounterKind::Likes).await? {
            IncrementOutcome::Shadowed(value) => {
                self.write_through(id, CounterKind::Likes, value).await
            }
            IncrementOutcome::Durable => Ok(()),
        }
    }

    /// Applies one increment without any checkpoint.
    ///
    /// Callers that want to detach the durable write use this and then hand
    /// the returned value to [`Self::write_through`].
    pub async fn record_increment(
        &self,
        id: QuestionId,
        kind: CounterKind,
    ) -> AskResult<IncrementOutcome> {
        let key = keys::counter(id, kind);

        match self.shadow_increment(id, kind, &key).await {
            Ok(value) => Ok(IncrementOutcome::Shadowed(value)),
            Err(e) if e.store() == Some(StoreKind::Fast) => {
                warn!("Fast store increment failed for '{}', using database: {}", key, e);
                CounterMetrics::fast_store_fallback(match kind {
                    CounterKind::Views => "increment_view",
                    CounterKind::Likes => "increment_like",
                });
                self.durable_increment(id, kind, &key).await?;
                Ok(IncrementOutcome::Durable)
            }
            Err(e) => Err(e),
        }
    }

    /// Writes a shadow value into the database column.
    pub async fn write_through(&self, id: QuestionId, kind: CounterKind, value: i64) -> AskResult<()> {
        match self.durable.checkpoint_counter(id, kind, value).await {
            Ok(()) => {
                debug!("Checkpointed {} = {} for question {}", kind, value, id);
                CounterMetrics::checkpoint_written(kind);
                Ok(())
            }
            Err(e) => {
                warn!("Checkpoint of {} = {} for question {} failed: {}", kind, value, id, e);
                Err(e)
            }
        }
    }

    async fn shadow_increment(&self, id: QuestionId, kind: CounterKind, key: &str) -> AskResult<i64> {
        let ttl = self.policy.counter_ttl;

        // Start a cold counter from the database value, not from zero.
        let seeded = if self.fast.exists(key).await? {
            false
        } else {
            let seed = self.durable_value(id, kind).await?;
            self.fast.set_if_absent(key, &seed.to_string(), ttl).await?
        };

        let mut value = self.fast.incr(key).await?;

        if value == 1 {
            if let Err(e) = self.fast.expire(key, ttl).await {
                warn!("Failed to set expiry on '{}': {}", key, e);
            }
            if !seeded {
                value = self.reseed(id, kind, key, value).await;
            }
        }

        Ok(value)
    }

    /// Lifts a shadow that `incr` recreated from nothing up to the column.
    ///
    /// Happens when the key expires between the existence check and the
    /// increment. On failure the shadow stays low until the next checkpoint.
    async fn reseed(&self, id: QuestionId, kind: CounterKind, key: &str, value: i64) -> i64 {
        let base = match self.durable_value(id, kind).await {
            Ok(base) if base > 0 => base,
            Ok(_) => return value,
            Err(e) => {
                warn!("Could not reseed '{}' from the database: {}", key, e);
                return value;
            }
        };

        match self.fast.incr_by(key, base).await {
            Ok(reseeded) => {
                debug!("Reseeded '{}' from {} to {}", key, value, reseeded);
                reseeded
            }
            Err(e) => {
                warn!("Could not reseed '{}': {}", key, e);
                value
            }
        }
    }

    async fn durable_increment(&self, id: QuestionId, kind: CounterKind, key: &str) -> AskResult<()> {
        if !self.durable.increment_counter(id, kind).await? {
            return Err(AskError::not_found("Question", id));
        }

        // The column may now be ahead of the shadow. Dropping it only takes
        // effect if the fast store answers; otherwise the stale shadow
        // survives and the next checkpoint folds this increment away.
        if let Err(e) = self.fast.del(key).await {
            debug!("Could not drop shadow counter '{}': {}", key, e);
        }

        Ok(())
    }

    async fn durable_value(&self, id: QuestionId, kind: CounterKind) -> AskResult<i64> {
        self.durable
            .find_counters(id)
            .await?
            .map(|counters| counters.get(kind))
            .ok_or_else(|| AskError::not_found("Question", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MockFastStore;
    use crate::testing::{InMemoryDurableStore, InMemoryFastStore};
    use futures::future::join_all;

    fn cache(
        fast: &Arc<InMemoryFastStore>,
        durable: &Arc<InMemoryDurableStore>,
    ) -> CounterCache {
        CounterCache::new(fast.clone(), durable.clone(), CounterPolicy::default())
    }

    fn views_checkpoints(durable: &InMemoryDurableStore) -> Vec<i64> {
        durable
            .checkpoints()
            .into_iter()
            .filter(|(_, kind, _)| *kind == CounterKind::Views)
            .map(|(_, _, value)| value)
            .collect()
    }

    #[test]
    fn test_policy_checkpoint_cadence() {
        let policy = CounterPolicy::default();
        assert!(!policy.is_view_checkpoint(0));
        assert!(!policy.is_view_checkpoint(4));
        assert!(policy.is_view_checkpoint(5));
        assert!(policy.is_view_checkpoint(15));
        assert!(!policy.is_view_checkpoint(16));
    }

    #[test]
    fn test_policy_from_config_clamps_interval() {
        let config = CountersConfig {
            view_checkpoint_interval: 0,
            ..CountersConfig::default()
        };
        assert_eq!(CounterPolicy::from(&config).view_checkpoint_interval, 1);
    }

    #[tokio::test]
    async fn test_cold_read_then_checkpoint_on_fifth_view() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(42, 10, 0));
        let counters = cache(&fast, &durable);
        let id = QuestionId(42);

        assert_eq!(counters.get_count(id, CounterKind::Views).await.unwrap(), 10);
        assert_eq!(fast.value("counter:42:views").as_deref(), Some("10"));

        for _ in 0..4 {
            counters.increment_view(id).await.unwrap();
        }
        assert_eq!(fast.value("counter:42:views").as_deref(), Some("14"));
        assert!(views_checkpoints(&durable).is_empty());
        assert_eq!(durable.counters(42).unwrap().view_count, 10);

        counters.increment_view(id).await.unwrap();
        assert_eq!(fast.value("counter:42:views").as_deref(), Some("15"));
        assert_eq!(views_checkpoints(&durable), vec![15]);
        assert_eq!(durable.counters(42).unwrap().view_count, 15);
    }

    #[tokio::test]
    async fn test_reads_between_checkpoints_come_from_fast_store() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(42, 10, 0));
        let counters = cache(&fast, &durable);
        let id = QuestionId(42);

        for _ in 0..3 {
            counters.increment_view(id).await.unwrap();
        }

        assert_eq!(durable.counters(42).unwrap().view_count, 10);
        assert_eq!(counters.get_count(id, CounterKind::Views).await.unwrap(), 13);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_increment_seeds_from_database() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(42, 10, 0));
        let counters = cache(&fast, &durable);

        counters.increment_view(QuestionId(42)).await.unwrap();

        assert_eq!(fast.value("counter:42:views").as_deref(), Some("11"));
        assert_eq!(fast.ttl("counter:42:views"), Some(Duration::from_secs(86_400)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_counter_gets_expiry() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(3, 0, 0));
        let counters = cache(&fast, &durable);

        counters.increment_view(QuestionId(3)).await.unwrap();
        assert_eq!(fast.value("counter:3:views").as_deref(), Some("1"));
        assert_eq!(fast.ttl("counter:3:views"), Some(Duration::from_secs(86_400)));

        tokio::time::advance(Duration::from_secs(86_401)).await;
        assert!(fast.value("counter:3:views").is_none());
    }

    #[tokio::test]
    async fn test_like_writes_through_every_increment() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(9, 0, 2));
        let counters = cache(&fast, &durable);

        counters.increment_like(QuestionId(9)).await.unwrap();
        counters.increment_like(QuestionId(9)).await.unwrap();

        assert_eq!(durable.counters(9).unwrap().like_count, 4);
        assert_eq!(
            durable.checkpoints(),
            vec![
                (QuestionId(9), CounterKind::Likes, 3),
                (QuestionId(9), CounterKind::Likes, 4)
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_likes_are_not_lost() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(5, 0, 7));
        let counters = Arc::new(cache(&fast, &durable));

        let tasks = (0..50).map(|_| {
            let counters = Arc::clone(&counters);
            tokio::spawn(async move { counters.increment_like(QuestionId(5)).await })
        });
        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(durable.counters(5).unwrap().like_count, 57);
        assert_eq!(fast.value("counter:5:likes").as_deref(), Some("57"));
    }

    #[tokio::test]
    async fn test_like_falls_back_when_fast_store_is_down() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(7, 0, 3));
        let counters = cache(&fast, &durable);
        fast.set_failing(true);

        counters.increment_like(QuestionId(7)).await.unwrap();

        assert_eq!(durable.counters(7).unwrap().like_count, 4);
        assert_eq!(durable.increments(), 1);
        assert!(durable.checkpoints().is_empty());
    }

    #[tokio::test]
    async fn test_view_falls_back_when_fast_store_is_down() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(7, 3, 0));
        let counters = cache(&fast, &durable);
        fast.set_failing(true);

        counters.increment_view(QuestionId(7)).await.unwrap();
        assert_eq!(durable.counters(7).unwrap().view_count, 4);
        assert_eq!(counters.get_count(QuestionId(7), CounterKind::Views).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_fallback_drops_stale_shadow() {
        let durable = Arc::new(InMemoryDurableStore::with_question(7, 0, 3));
        let mut fast = MockFastStore::new();
        fast.expect_exists()
            .returning(|_| Err(AskError::fast_unavailable("timeout")));
        fast.expect_del()
            .withf(|key| key == "counter:7:likes")
            .times(1)
            .returning(|_| Ok(()));
        let counters = CounterCache::new(Arc::new(fast), durable.clone(), CounterPolicy::default());

        counters.increment_like(QuestionId(7)).await.unwrap();
        assert_eq!(durable.counters(7).unwrap().like_count, 4);
    }

    #[tokio::test]
    async fn test_expire_failure_does_not_double_count() {
        let durable = Arc::new(InMemoryDurableStore::with_question(1, 0, 0));
        let mut fast = MockFastStore::new();
        fast.expect_exists().returning(|_| Ok(false));
        fast.expect_set_if_absent().returning(|_, _, _| Ok(true));
        fast.expect_incr().times(1).returning(|_| Ok(1));
        fast.expect_expire()
            .returning(|_, _| Err(AskError::fast_unavailable("timeout")));
        let counters = CounterCache::new(Arc::new(fast), durable.clone(), CounterPolicy::default());

        counters.increment_like(QuestionId(1)).await.unwrap();
        assert_eq!(durable.increments(), 0);
        assert_eq!(durable.counters(1).unwrap().like_count, 1);
    }

    #[tokio::test]
    async fn test_shadow_expiring_mid_increment_is_reseeded() {
        let durable = Arc::new(InMemoryDurableStore::with_question(9, 100, 0));
        let mut fast = MockFastStore::new();
        fast.expect_exists().returning(|_| Ok(true));
        fast.expect_incr().times(1).returning(|_| Ok(1));
        fast.expect_expire().returning(|_, _| Ok(()));
        fast.expect_incr_by()
            .withf(|key, delta| key == "counter:9:views" && *delta == 100)
            .times(1)
            .returning(|_, delta| Ok(1 + delta));
        let counters = CounterCache::new(Arc::new(fast), durable.clone(), CounterPolicy::default());

        let outcome = counters
            .record_increment(QuestionId(9), CounterKind::Views)
            .await
            .unwrap();
        assert_eq!(outcome, IncrementOutcome::Shadowed(101));
    }

    #[tokio::test]
    async fn test_new_counter_at_one_is_not_reseeded() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(3, 0, 0));
        let counters = cache(&fast, &durable);

        counters.increment_like(QuestionId(3)).await.unwrap();
        assert_eq!(fast.value("counter:3:likes").as_deref(), Some("1"));
        assert_eq!(durable.counters(3).unwrap().like_count, 1);
    }

    #[tokio::test]
    async fn test_shadow_outlives_fallback_when_delete_fails() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(42, 10, 0));
        let counters = cache(&fast, &durable);
        let id = QuestionId(42);
        assert_eq!(counters.get_count(id, CounterKind::Views).await.unwrap(), 10);

        fast.set_failing(true);
        counters.increment_view(id).await.unwrap();
        fast.set_failing(false);

        // The delete went to the same unreachable store, so the shadow is stale.
        assert_eq!(durable.counters(42).unwrap().view_count, 11);
        assert_eq!(counters.get_count(id, CounterKind::Views).await.unwrap(), 10);

        for _ in 0..5 {
            counters.increment_view(id).await.unwrap();
        }
        assert_eq!(durable.counters(42).unwrap().view_count, 15);
    }

    #[tokio::test]
    async fn test_get_count_recovers_after_data_loss() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(42, 10, 0));
        let counters = cache(&fast, &durable);
        let id = QuestionId(42);

        for _ in 0..5 {
            counters.increment_view(id).await.unwrap();
        }
        fast.flush();

        assert_eq!(counters.get_count(id, CounterKind::Views).await.unwrap(), 15);
        assert_eq!(fast.value("counter:42:views").as_deref(), Some("15"));

        durable.set_failing(true);
        assert_eq!(counters.get_count(id, CounterKind::Views).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn test_get_count_uses_database_when_fast_store_is_down() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(42, 10, 2));
        let counters = cache(&fast, &durable);
        fast.set_failing(true);

        let values = counters.get_counters(QuestionId(42)).await.unwrap();
        assert_eq!(values.view_count, 10);
        assert_eq!(values.like_count, 2);
    }

    #[tokio::test]
    async fn test_get_count_ignores_corrupt_shadow() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(42, 10, 0));
        let counters = cache(&fast, &durable);
        fast.insert("counter:42:views", "garbage");

        assert_eq!(counters.get_count(QuestionId(42), CounterKind::Views).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_unknown_question_is_not_found() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::new());
        let counters = cache(&fast, &durable);

        let err = counters.get_count(QuestionId(404), CounterKind::Views).await.unwrap_err();
        assert!(err.is_not_found());

        let err = counters.increment_like(QuestionId(404)).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(fast.value("counter:404:likes").is_none());

        fast.set_failing(true);
        let err = counters.increment_view(QuestionId(404)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_dropped_view_checkpoint_is_not_an_error() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(42, 0, 0));
        let counters = cache(&fast, &durable);

        for _ in 0..4 {
            counters.increment_view(QuestionId(42)).await.unwrap();
        }
        durable.set_failing(true);

        counters.increment_view(QuestionId(42)).await.unwrap();
        assert_eq!(fast.value("counter:42:views").as_deref(), Some("5"));
        assert_eq!(durable.counters(42).unwrap().view_count, 0);
    }

    #[tokio::test]
    async fn test_failed_like_write_through_is_surfaced() {
        let fast = Arc::new(InMemoryFastStore::new());
        let durable = Arc::new(InMemoryDurableStore::with_question(42, 0, 0));
        let counters = cache(&fast, &durable);

        counters.increment_like(QuestionId(42)).await.unwrap();
        durable.set_failing(true);

        let err = counters.increment_like(QuestionId(42)).await.unwrap_err();
        assert_eq!(err.store(), Some(StoreKind::Durable));
    }
}
