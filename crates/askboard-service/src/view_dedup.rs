//! One counted view per viewer per question per window.

use crate::cache::{keys, FastStore};
use crate::metrics::CounterMetrics;
use askboard_core::QuestionId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Suppresses repeat views from the same viewer.
///
/// The marker key `viewed:{id}:{viewer}` lives only in the fast store. When
/// the fast store is unreachable every view is counted.
pub struct ViewDedupGuard {
    fast: Arc<dyn FastStore>,
    window: Duration,
}

impl ViewDedupGuard {
    /// Creates a guard whose markers last for `window`.
    #[must_use]
    pub fn new(fast: Arc<dyn FastStore>, window: Duration) -> Self {
        Self { fast, window }
    }

    /// Returns true when this view should be counted.
    pub async fn should_count_view(&self, id: QuestionId, viewer: &str) -> bool {
        let key = keys::viewed(id, viewer);

        match self.fast.exists(&key).await {
            Ok(true) => {
                debug!("Repeat view of question {} by '{}' suppressed", id, viewer);
                CounterMetrics::view_deduplicated(false);
                false
            }
            Ok(false) => {
                if let Err(e) = self.fast.set(&key, "1", self.window).await {
                    warn!("Failed to mark '{}' as viewed: {}", key, e);
                }
                CounterMetrics::view_deduplicated(true);
                true
            }
            Err(e) => {
                warn!("View dedup unavailable for '{}', counting view: {}", key, e);
                CounterMetrics::fast_store_fallback("should_count_view");
                true
            }
        }
    }
}
