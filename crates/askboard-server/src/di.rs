//! Component wiring.
//!
//! Builds the durable store, the fast store, and the counter layer, and
//! assembles the question service from them.

use askboard_config::{AppConfig, CountersConfig, RedisConfig};
use askboard_core::AskResult;
use askboard_repository::{create_pool, DatabasePoolInterface, MySqlQuestionRepository};
use askboard_service::{
    create_redis_pool, BackgroundTasks, CacheInvalidator, CounterCache, CounterPolicy, FastStore,
    QuestionService, QuestionServiceImpl, RedisFastStore, ResponseCache, ViewDedupGuard,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the HTTP layer needs.
pub struct AppComponents {
    pub database: Arc<dyn DatabasePoolInterface>,
    pub fast_store: Arc<dyn FastStore>,
    pub question_service: Arc<dyn QuestionService>,
}

/// Connects both stores and wires the service.
pub async fn build_components(config: &AppConfig) -> AskResult<AppComponents> {
    let pool = create_pool(&config.database).await?;
    if config.database.run_migrations {
        pool.run_migrations().await?;
    }
    let database: Arc<dyn DatabasePoolInterface> = pool;

    let fast_store = build_fast_store(&config.redis).await?;
    let question_service =
        build_question_service(Arc::clone(&database), Arc::clone(&fast_store), &config.counters);

    Ok(AppComponents {
        database,
        fast_store,
        question_service,
    })
}

/// Creates the Redis-backed fast store, or a disabled one.
///
/// A disabled store fails every call, which puts the counter layer in its
/// database-only mode.
pub async fn build_fast_store(config: &RedisConfig) -> AskResult<Arc<dyn FastStore>> {
    if !config.enabled {
        warn!("Redis disabled, counters and caches will use the database only");
        return Ok(Arc::new(RedisFastStore::disabled()));
    }

    let pool = create_redis_pool(config).await?;
    Ok(Arc::new(RedisFastStore::new(Arc::new(pool))))
}

/// Assembles the question service over the given stores.
pub fn build_question_service(
    database: Arc<dyn DatabasePoolInterface>,
    fast_store: Arc<dyn FastStore>,
    counters: &CountersConfig,
) -> Arc<dyn QuestionService> {
    let repository = Arc::new(MySqlQuestionRepository::new(database));
    let policy = CounterPolicy::from(counters);

    info!(
        "Counter policy: ttl={}s, view checkpoint every {}",
        policy.counter_ttl.as_secs(),
        policy.view_checkpoint_interval
    );

    let counter_cache = Arc::new(CounterCache::new(
        Arc::clone(&fast_store),
        repository.clone(),
        policy,
    ));
    let dedup = Arc::new(ViewDedupGuard::new(Arc::clone(&fast_store), counters.dedup_ttl()));
    let responses = Arc::new(ResponseCache::new(fast_store, counters.detail_ttl()));
    let invalidator = Arc::new(CacheInvalidator::new(Arc::clone(&responses)));

    Arc::new(QuestionServiceImpl::new(
        repository,
        counter_cache,
        dedup,
        responses,
        invalidator,
        BackgroundTasks::new(),
    ))
}
