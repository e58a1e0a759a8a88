//! Unified error types for all layers of the application.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use thiserror::Error;

/// The two backing stores behind the counter layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Ephemeral key/value accelerator (Redis).
    Fast,
    /// Authoritative relational storage (MySQL).
    Durable,
}

impl Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => write!(f, "fast store"),
            Self::Durable => write!(f, "durable store"),
        }
    }
}

/// Unified error type for Askboard.
#[derive(Error, Debug)]
pub enum AskError {
    // ============ Domain Errors ============
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    // ============ Infrastructure Errors ============
    /// A backing store could not be reached or rejected the operation.
    #[error("Store unavailable: {store} - {message}")]
    StoreUnavailable { store: StoreKind, message: String },

    /// A best-effort checkpoint was lost. Never fatal.
    #[error("Stale write: {0}")]
    StaleWrite(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AskError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) => 400,
            Self::StoreUnavailable { .. } => 503,
            Self::StaleWrite(_) | Self::Configuration(_) | Self::Internal(_) | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            Self::StaleWrite(_) => "STALE_WRITE",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an unavailable error for the fast store.
    #[must_use]
    pub fn fast_unavailable<T: Into<String>>(message: T) -> Self {
        Self::StoreUnavailable {
            store: StoreKind::Fast,
            message: message.into(),
        }
    }

    /// Creates an unavailable error for the durable store.
    #[must_use]
    pub fn durable_unavailable<T: Into<String>>(message: T) -> Self {
        Self::StoreUnavailable {
            store: StoreKind::Durable,
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the store this error originated from, if any.
    #[must_use]
    pub const fn store(&self) -> Option<StoreKind> {
        match self {
            Self::StoreUnavailable { store, .. } => Some(*store),
            _ => None,
        }
    }

    /// Checks if this error means the requested question does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AskError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource_type: "database_row",
                id: "unknown".to_string(),
            },
            _ => Self::durable_unavailable(err.to_string()),
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for AskError {
    fn from(err: redis::RedisError) -> Self {
        Self::fast_unavailable(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<deadpool_redis::PoolError> for AskError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::fast_unavailable(format!("Failed to get Redis connection: {err}"))
    }
}

impl From<serde_json::Error> for AskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-level validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}

impl ErrorResponse {
    /// Creates a new error response from an `AskError`.
    #[must_use]
    pub fn from_error(error: &AskError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            details: None,
        }
    }

    /// Sets field-level validation errors.
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&AskError> for ErrorResponse {
    fn from(error: &AskError) -> Self {
        Self::from_error(error)
    }
}
