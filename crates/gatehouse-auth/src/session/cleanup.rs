//! Periodic purge of expired refresh tokens and finished rate-limit windows.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use gatehouse_database::{LedgerError, RefreshTokenLedger};

use crate::ratelimit::AuthRateLimiter;

/// Handles periodic cleanup of expired ledger records.
#[derive(Clone)]
pub struct LedgerCleanup {
    /// Ledger to purge.
    ledger: Arc<dyn RefreshTokenLedger>,
    /// Limiter whose stale windows are dropped on the same cadence.
    limiter: Option<AuthRateLimiter>,
    /// Time between cycles.
    interval: Duration,
}

impl std::fmt::Debug for LedgerCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerCleanup")
            .field("interval", &self.interval)
            .finish()
    }
}

impl LedgerCleanup {
    /// Creates a new cleanup handler.
    pub fn new(ledger: Arc<dyn RefreshTokenLedger>, interval: Duration) -> Self {
        Self {
            ledger,
            limiter: None,
            interval,
        }
    }

    /// Also prune the given rate limiter each cycle.
    pub fn with_rate_limiter(mut self, limiter: AuthRateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Runs one cleanup cycle.
    ///
    /// Returns the number of refresh-token records deleted.
    pub async fn run_cleanup(&self) -> Result<u64, LedgerError> {
        if let Some(limiter) = &self.limiter {
            let pruned = limiter.prune();
            if pruned > 0 {
                debug!(pruned = pruned, "Pruned finished rate-limit windows");
            }
        }

        let deleted = self.ledger.delete_expired().await?;
        if deleted > 0 {
            info!(deleted = deleted, "Deleted expired refresh tokens");
        }
        Ok(deleted)
    }

    /// Spawns the cleanup loop on the runtime. Abort the handle to stop it.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_cleanup().await {
                    error!(error = %e, "Ledger cleanup cycle failed");
                }
            }
        })
    }
}
