//! Auth endpoint rate limiting configuration.

use serde::{Deserialize, Serialize};

/// Fixed-window budget applied per source address to the auth routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether the limiter is installed at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests admitted per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Window length in seconds.
    #[serde(default = "default_window")]
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_requests: default_max_requests(),
            window_seconds: default_window(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_requests() -> u32 {
    10
}

fn default_window() -> u64 {
    60
}
