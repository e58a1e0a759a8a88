//! # Askboard Service
//!
//! The counter layer (fast-store shadow counters with durable checkpoints,
//! view deduplication, response caching, invalidation) and the question
//! service built on top of it.

pub mod background;
pub mod cache;
pub mod counter_cache;
pub mod dto;
pub mod r#impl;
pub mod invalidator;
pub mod metrics;
pub mod question_service;
pub mod response_cache;
pub mod view_dedup;

#[cfg(test)]
pub(crate) mod testing;

pub use background::*;
pub use cache::*;
pub use counter_cache::*;
pub use dto::*;
pub use invalidator::*;
pub use question_service::*;
pub use r#impl::QuestionServiceImpl;
pub use response_cache::*;
pub use view_dedup::*;
