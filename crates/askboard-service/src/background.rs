//! Detached work that must not delay the response.

use crate::metrics::CounterMetrics;
use askboard_core::AskResult;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Called once with the task name and outcome of every spawned task.
pub type CompletionHook = Arc<dyn Fn(&'static str, &AskResult<()>) + Send + Sync>;

/// Spawns fire-and-forget tasks onto the tokio runtime.
///
/// Failures are logged and counted; nothing is propagated to the caller.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    hook: Option<CompletionHook>,
}

impl BackgroundTasks {
    /// Creates a spawner without a completion hook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a spawner that reports every outcome to `hook`.
    #[must_use]
    pub fn with_completion_hook(hook: CompletionHook) -> Self {
        Self { hook: Some(hook) }
    }

    /// Runs `task` in the background.
    ///
    /// The handle is only useful to tests; dropping it does not cancel the task.
    pub fn spawn<F>(&self, name: &'static str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = AskResult<()>> + Send + 'static,
    {
        let hook = self.hook.clone();

        tokio::spawn(async move {
            let result = task.await;

            match &result {
                Ok(()) => debug!("Background task '{}' completed", name),
                Err(e) => {
                    warn!("Background task '{}' failed: {}", name, e);
                    CounterMetrics::background_task_failed(name);
                }
            }

            if let Some(hook) = hook {
                hook(name, &result);
            }
        })
    }
}

impl std::fmt::Debug for BackgroundTasks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundTasks")
            .field("has_hook", &self.hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askboard_core::AskError;
    use parking_lot::Mutex;

    #[tokio::test]
    async fn test_spawn_reports_outcomes() {
        let seen: Arc<Mutex<Vec<(&'static str, bool)>>> = Arc::default();
        let sink = seen.clone();
        let tasks = BackgroundTasks::with_completion_hook(Arc::new(move |name, result| {
            sink.lock().push((name, result.is_ok()));
        }));

        tasks.spawn("ok", async { Ok(()) }).await.unwrap();
        tasks
            .spawn("fails", async { Err(AskError::durable_unavailable("down")) })
            .await
            .unwrap();

        assert_eq!(*seen.lock(), vec![("ok", true), ("fails", false)]);
    }

    #[tokio::test]
    async fn test_failure_does_not_panic_without_hook() {
        let tasks = BackgroundTasks::new();
        let handle = tasks.spawn("fails", async { Err(AskError::internal("boom")) });
        assert!(handle.await.is_ok());
    }
}
