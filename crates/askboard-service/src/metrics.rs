//! Prometheus metrics for the counter layer.

use askboard_core::{CounterKind, MutationKind};
use metrics::{counter, describe_counter};

/// Metric names for the counter layer.
pub mod names {
    /// Fast store calls that failed and fell back to the database.
    pub const FAST_STORE_FALLBACKS_TOTAL: &str = "askboard_fast_store_fallbacks_total";
    /// Counter checkpoints written to the database.
    pub const CHECKPOINTS_WRITTEN_TOTAL: &str = "askboard_checkpoints_written_total";
    /// Counter checkpoints lost to a database failure.
    pub const CHECKPOINTS_DROPPED_TOTAL: &str = "askboard_checkpoints_dropped_total";
    /// Views that passed deduplication.
    pub const VIEWS_COUNTED_TOTAL: &str = "askboard_views_counted_total";
    /// Repeat views suppressed by deduplication.
    pub const VIEWS_SUPPRESSED_TOTAL: &str = "askboard_views_suppressed_total";
    /// Response cache hits.
    pub const RESPONSE_CACHE_HITS_TOTAL: &str = "askboard_response_cache_hits_total";
    /// Response cache misses.
    pub const RESPONSE_CACHE_MISSES_TOTAL: &str = "askboard_response_cache_misses_total";
    /// Cache invalidations issued after a mutation.
    pub const INVALIDATIONS_TOTAL: &str = "askboard_cache_invalidations_total";
    /// Background tasks that finished with an error.
    pub const BACKGROUND_TASK_FAILURES_TOTAL: &str = "askboard_background_task_failures_total";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::FAST_STORE_FALLBACKS_TOTAL,
        "Fast store operations that fell back to the database"
    );
    describe_counter!(
        names::CHECKPOINTS_WRITTEN_TOTAL,
        "Counter checkpoints written to the database"
    );
    describe_counter!(
        names::CHECKPOINTS_DROPPED_TOTAL,
        "Counter checkpoints dropped because the database was unavailable"
    );
    describe_counter!(names::VIEWS_COUNTED_TOTAL, "Views counted after deduplication");
    describe_counter!(names::VIEWS_SUPPRESSED_TOTAL, "Repeat views suppressed");
    describe_counter!(names::RESPONSE_CACHE_HITS_TOTAL, "Question detail cache hits");
    describe_counter!(names::RESPONSE_CACHE_MISSES_TOTAL, "Question detail cache misses");
    describe_counter!(names::INVALIDATIONS_TOTAL, "Cache invalidations by mutation kind");
    describe_counter!(
        names::BACKGROUND_TASK_FAILURES_TOTAL,
        "Detached background tasks that returned an error"
    );
}

/// Counter layer metrics recorder.
#[derive(Clone)]
pub struct CounterMetrics;

impl CounterMetrics {
    /// Record a fast store failure handled by falling back.
    pub fn fast_store_fallback(operation: &'static str) {
        counter!(names::FAST_STORE_FALLBACKS_TOTAL, "operation" => operation).increment(1);
    }

    /// Record a checkpoint written.
    pub fn checkpoint_written(kind: CounterKind) {
        counter!(names::CHECKPOINTS_WRITTEN_TOTAL, "kind" => kind.as_str()).increment(1);
    }

    /// Record a checkpoint dropped.
    pub fn checkpoint_dropped(kind: CounterKind) {
        counter!(names::CHECKPOINTS_DROPPED_TOTAL, "kind" => kind.as_str()).increment(1);
    }

    /// Record a dedup decision.
    pub fn view_deduplicated(counted: bool) {
        if counted {
            counter!(names::VIEWS_COUNTED_TOTAL).increment(1);
        } else {
            counter!(names::VIEWS_SUPPRESSED_TOTAL).increment(1);
        }
    }

    /// Record a response cache lookup.
    pub fn response_cache_lookup(hit: bool) {
        if hit {
            counter!(names::RESPONSE_CACHE_HITS_TOTAL).increment(1);
        } else {
            counter!(names::RESPONSE_CACHE_MISSES_TOTAL).increment(1);
        }
    }

    /// Record an invalidation.
    pub fn invalidated(kind: MutationKind) {
        counter!(names::INVALIDATIONS_TOTAL, "mutation" => kind.as_str()).increment(1);
    }

    /// Record a failed background task.
    pub fn background_task_failed(task: &'static str) {
        counter!(names::BACKGROUND_TASK_FAILURES_TOTAL, "task" => task).increment(1);
    }
}
