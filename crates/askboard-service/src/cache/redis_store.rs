//! Redis-backed fast store.

use super::FastStore;
use askboard_config::RedisConfig;
use askboard_core::{AskError, AskResult};
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Config, Pool, Runtime};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Builds the Redis pool and checks that the server answers.
///
/// An unreachable server is logged and the pool is still returned, so the
/// counter layer starts in its database-only mode and recovers on its own.
pub async fn create_redis_pool(config: &RedisConfig) -> AskResult<Pool> {
    info!("Creating Redis connection pool...");

    let pool = Config::from_url(&config.url)
        .builder()
        .map_err(|e| AskError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size as usize)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| AskError::Configuration(format!("Failed to create Redis pool: {}", e)))?;

    match ping(&pool).await {
        Ok(()) => info!("Redis connection pool created successfully"),
        Err(e) => warn!("Redis is not reachable yet, counters will use the database: {}", e),
    }

    Ok(pool)
}

async fn ping(pool: &Pool) -> AskResult<()> {
    let mut conn = pool.get().await?;
    deadpool_redis::redis::cmd("PING")
        .query_async::<String>(&mut *conn)
        .await?;
    Ok(())
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

/// Redis-based fast store.
pub struct RedisFastStore {
    /// Redis connection pool. `None` when Redis is disabled.
    pool: Option<Arc<Pool>>,
}

impl RedisFastStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool: Some(pool) }
    }

    /// Creates a store that reports every call as unavailable.
    #[must_use]
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    /// Whether a Redis pool is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_conn(&self) -> AskResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => Ok(pool.get().await?),
            None => Err(AskError::fast_unavailable("Redis is disabled")),
        }
    }
}

#[async_trait]
impl FastStore for RedisFastStore {
    async fn get(&self, key: &str) -> AskResult<Option<String>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await?;

        match &value {
            Some(_) => debug!("Fast store hit for key '{}'", key),
            None => debug!("Fast store miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AskResult<()> {
        let mut conn = self.get_conn().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl)).await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> AskResult<bool> {
        let mut conn = self.get_conn().await?;
        let reply: Option<String> = deadpool_redis::redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut *conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn incr(&self, key: &str) -> AskResult<i64> {
        self.incr_by(key, 1).await
    }

    async fn incr_by(&self, key: &str, delta: i64) -> AskResult<i64> {
        let mut conn = self.get_conn().await?;
        let value: i64 = conn.incr(key, delta).await?;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AskResult<()> {
        let mut conn = self.get_conn().await?;
        let secs = i64::try_from(ttl_secs(ttl)).unwrap_or(i64::MAX);
        conn.expire::<_, ()>(key, secs).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AskResult<bool> {
        let mut conn = self.get_conn().await?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn del(&self, key: &str) -> AskResult<()> {
        let mut conn = self.get_conn().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askboard_core::StoreKind;

    #[test]
    fn test_ttl_rounds_up_to_one_second() {
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(86_400)), 86_400);
    }

    #[tokio::test]
    async fn test_disabled_store_reports_fast_unavailable() {
        let store = RedisFastStore::disabled();
        assert!(!store.is_enabled());

        let err = store.incr("counter:1:views").await.unwrap_err();
        assert_eq!(err.store(), Some(StoreKind::Fast));
        assert!(store.get("detail:1").await.is_err());
        assert!(store.del("detail:1").await.is_err());
    }
}
