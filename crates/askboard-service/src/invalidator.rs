//! Eviction of cached payloads after a committed mutation.

use crate::metrics::CounterMetrics;
use crate::response_cache::ResponseCache;
use askboard_core::{AskResult, MutationKind, QuestionId};
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps a mutation to the cache entries it makes stale.
///
/// Call only after the mutating transaction has committed.
pub struct CacheInvalidator {
    responses: Arc<ResponseCache>,
}

impl CacheInvalidator {
    /// Creates an invalidator evicting from `responses`.
    #[must_use]
    pub fn new(responses: Arc<ResponseCache>) -> Self {
        Self { responses }
    }

    /// Evicts what `kind` invalidates. Failures are logged; the entry then
    /// ages out on its TTL.
    pub async fn on_mutation(&self, kind: MutationKind, id: QuestionId) {
        if kind.is_per_question() {
            let result = self.responses.invalidate(id).await;
            Self::report(kind, id, "detail", result);
        }
        if kind.affects_list() {
            let result = self.responses.invalidate_list().await;
            Self::report(kind, id, "list", result);
        }
    }

    fn report(kind: MutationKind, id: QuestionId, entry: &str, result: AskResult<()>) {
        match result {
            Ok(()) => {
                debug!("Invalidated {} cache for {} on question {}", entry, kind, id);
                CounterMetrics::invalidated(kind);
            }
            Err(e) => warn!(
                "{} cache invalidation for {} on question {} failed: {}",
                entry, kind, id, e
            ),
        }
    }
}
