//! Outbound notifications about credential events.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// A failed notification delivery.
#[derive(Debug, Clone, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Delivers credential-related messages to account holders.
///
/// Failures are reported to the caller, which treats them as non-fatal.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Deliver a password-reset token.
    async fn send_password_reset(&self, email: &str, token: &str) -> Result<(), NotifyError>;

    /// Tell the account holder their password was changed.
    async fn send_password_changed(&self, email: &str) -> Result<(), NotifyError>;
}

/// Notifier that only records dispatches in the log.
///
/// The reset token itself is never written out.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a new log notifier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_password_reset(&self, email: &str, _token: &str) -> Result<(), NotifyError> {
        info!(email = %email, "Password reset notification dispatched");
        Ok(())
    }

    async fn send_password_changed(&self, email: &str) -> Result<(), NotifyError> {
        info!(email = %email, "Password changed notification dispatched");
        Ok(())
    }
}
