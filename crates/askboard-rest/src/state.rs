//! Application state for Axum handlers.

use askboard_repository::DatabasePoolInterface;
use askboard_service::QuestionService;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub question_service: Arc<dyn QuestionService>,
    /// Probed by `/ready`. Without it readiness always succeeds.
    pub database: Option<Arc<dyn DatabasePoolInterface>>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(question_service: Arc<dyn QuestionService>) -> Self {
        Self {
            question_service,
            database: None,
        }
    }

    /// Attaches the database pool used by the readiness check.
    #[must_use]
    pub fn with_database(mut self, database: Arc<dyn DatabasePoolInterface>) -> Self {
        self.database = Some(database);
        self
    }
}
