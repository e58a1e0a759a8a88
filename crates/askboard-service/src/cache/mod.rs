//! Fast store access for the counter layer.
//!
//! [`FastStore`] is the narrow set of single-key primitives the counter layer
//! relies on; [`RedisFastStore`] backs it with a deadpool-managed Redis pool.

pub mod keys;
mod fast_store;
mod redis_store;

pub use fast_store::FastStore;
#[cfg(test)]
pub use fast_store::MockFastStore;
pub use redis_store::{create_redis_pool, RedisFastStore};
