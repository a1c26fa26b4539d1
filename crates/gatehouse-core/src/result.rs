//! Convenience result type alias for Gatehouse.

use crate::error::AppError;

/// A specialized `Result` type for infrastructure operations.
pub type AppResult<T> = Result<T, AppError>;
