//! Outward-facing failures of the session lifecycle.

use thiserror::Error;

use gatehouse_core::error::{AppError, ErrorKind};
use gatehouse_database::LedgerError;

use crate::jwt::TokenError;
use crate::password::PasswordError;

/// Errors returned by [`SessionLifecycle`](super::SessionLifecycle).
///
/// Security-sensitive distinctions (unknown user vs. wrong password,
/// replayed vs. unknown refresh token) are logged and collapsed into
/// `Unauthorized` before they reach this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Credentials or token rejected.
    #[error("invalid credentials")]
    Unauthorized,
    /// The account is deactivated.
    #[error("account is disabled")]
    Forbidden,
    /// The email is already registered.
    #[error("email already registered")]
    Conflict,
    /// Input failed validation.
    #[error("{0}")]
    Validation(String),
    /// The reset token does not exist or was already used.
    #[error("invalid reset token")]
    InvalidToken,
    /// The reset token is past its expiry.
    #[error("reset token expired")]
    ExpiredToken,
    /// The new password equals the current one.
    #[error("new password must differ from the current password")]
    SamePassword,
    /// The operation did not finish before its deadline.
    #[error("operation timed out")]
    DeadlineExceeded,
    /// Unexpected infrastructure failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PasswordError> for LifecycleError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Hashing(msg) => Self::Internal(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<TokenError> for LifecycleError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing => Self::Internal(err.to_string()),
            TokenError::Invalid | TokenError::Expired => Self::Unauthorized,
        }
    }
}

impl From<LedgerError> for LifecycleError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound | LedgerError::Revoked => Self::Unauthorized,
            LedgerError::Storage(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<AppError> for LifecycleError {
    fn from(err: AppError) -> Self {
        match err.kind {
            ErrorKind::Conflict => Self::Conflict,
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Unauthorized => AppError::unauthorized(err.to_string()),
            LifecycleError::Forbidden => AppError::forbidden(err.to_string()),
            LifecycleError::Conflict => AppError::conflict(err.to_string()),
            LifecycleError::Validation(_)
            | LifecycleError::InvalidToken
            | LifecycleError::ExpiredToken
            | LifecycleError::SamePassword => AppError::validation(err.to_string()),
            LifecycleError::DeadlineExceeded => AppError::service_unavailable(err.to_string()),
            // Infrastructure detail stays in the logs.
            LifecycleError::Internal(_) => AppError::internal("An internal error occurred"),
        }
    }
}
