//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gatehouse_auth::{AuthRateLimiter, SessionLifecycle};
use gatehouse_database::DatabasePool;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Credential flows.
    pub lifecycle: Arc<SessionLifecycle>,
    /// Admission control for auth routes. `None` disables it.
    pub rate_limiter: Option<AuthRateLimiter>,
    /// PostgreSQL pool, when running against a database.
    pub db_pool: Option<DatabasePool>,
    /// Deadline applied to every lifecycle call.
    pub request_timeout: Duration,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Creates state with the given lifecycle and no limiter or pool.
    pub fn new(lifecycle: Arc<SessionLifecycle>, request_timeout: Duration) -> Self {
        Self {
            lifecycle,
            rate_limiter: None,
            db_pool: None,
            request_timeout,
            started_at: Instant::now(),
        }
    }

    /// Puts a rate limiter in front of the auth routes.
    pub fn with_rate_limiter(mut self, limiter: AuthRateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Attaches the database pool used by the health endpoint.
    pub fn with_db_pool(mut self, pool: DatabasePool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
