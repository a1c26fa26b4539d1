//! Notification channel and background maintenance configuration.

use serde::{Deserialize, Serialize};

/// Outbound notification channel settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotificationConfig {
    /// Whether a reset/notification channel is configured. When disabled,
    /// forgot-password requests are accepted but never issue a token.
    #[serde(default)]
    pub enabled: bool,
}

/// Periodic cleanup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Interval between expired refresh-token purges, in seconds.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    3600
}
