//! Question service implementations.
//!
//! Trait definitions live in the parent module (`question_service.rs`).

pub mod question_service_impl;

pub use question_service_impl::QuestionServiceImpl;
