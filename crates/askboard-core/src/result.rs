//! Result type aliases for Askboard.

use crate::AskError;

/// A specialized `Result` type for Askboard operations.
pub type AskResult<T> = Result<T, AskError>;
