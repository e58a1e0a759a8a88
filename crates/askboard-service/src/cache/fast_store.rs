//! Fast store primitives.

use askboard_core::{AskResult, Interface};
use async_trait::async_trait;
use std::time::Duration;

/// Ephemeral key/value store with expiring keys and atomic increment.
///
/// Every method is atomic at the single-key level and safe under concurrent
/// callers. Failures are reported as `StoreUnavailable { store: Fast }`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FastStore: Interface + Send + Sync {
    /// Reads a key. `None` if absent or expired.
    async fn get(&self, key: &str) -> AskResult<Option<String>>;

    /// Writes a key with an expiry, overwriting any existing value.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AskResult<()>;

    /// Writes a key with an expiry only if it is absent.
    /// Returns true if this call created the key.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> AskResult<bool>;

    /// Increments a key by one, creating it at 0 first if absent.
    /// Returns the post-increment value.
    async fn incr(&self, key: &str) -> AskResult<i64>;

    /// Adds `delta` to a key, creating it at 0 first if absent.
    /// Returns the post-increment value.
    async fn incr_by(&self, key: &str, delta: i64) -> AskResult<i64>;

    /// Sets the expiry of an existing key.
    async fn expire(&self, key: &str, ttl: Duration) -> AskResult<()>;

    /// Checks whether a key exists.
    async fn exists(&self, key: &str) -> AskResult<bool>;

    /// Deletes a key. Deleting an absent key is not an error.
    async fn del(&self, key: &str) -> AskResult<()>;
}
