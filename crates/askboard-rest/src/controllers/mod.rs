//! REST API controllers.

pub mod health_controller;
pub mod question_controller;

pub use health_controller::*;
