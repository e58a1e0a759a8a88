//! # Askboard REST
//!
//! REST API layer using Axum for Askboard.
//! Provides the question endpoints and health checks.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
