//! # Askboard Server Library
//!
//! Wiring, telemetry, and startup utilities for the Askboard server binary.

pub mod di;
pub mod startup;
pub mod telemetry;
