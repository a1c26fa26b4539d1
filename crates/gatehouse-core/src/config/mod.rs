//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod maintenance;
pub mod rate_limit;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::maintenance::{CleanupConfig, NotificationConfig};
pub use self::rate_limit::RateLimitConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Auth endpoint rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Notification channel settings.
    #[serde(default)]
    pub notification: NotificationConfig,
    /// Background cleanup settings.
    #[serde(default)]
    pub cleanup: CleanupConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `GATEHOUSE__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("GATEHOUSE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject configurations the auth core cannot run safely with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.len() < auth::MIN_SECRET_BYTES {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be at least {} bytes",
                auth::MIN_SECRET_BYTES
            )));
        }
        check_ttl(
            "auth.access_token_ttl_minutes",
            self.auth.access_token_ttl_minutes,
            auth::MAX_ACCESS_TTL_MINUTES,
        )?;
        check_ttl(
            "auth.refresh_token_ttl_hours",
            self.auth.refresh_token_ttl_hours,
            auth::MAX_REFRESH_TTL_HOURS,
        )?;
        check_ttl(
            "auth.reset_token_ttl_minutes",
            self.auth.reset_token_ttl_minutes,
            auth::MAX_RESET_TTL_MINUTES,
        )?;
        if self.auth.reset_token_bytes == 0 {
            return Err(AppError::configuration(
                "auth.reset_token_bytes must be positive",
            ));
        }
        if self.cleanup.interval_seconds == 0 {
            return Err(AppError::configuration(
                "cleanup.interval_seconds must be positive",
            ));
        }
        if self.server.request_timeout_seconds == 0 {
            return Err(AppError::configuration(
                "server.request_timeout_seconds must be positive",
            ));
        }
        if self.rate_limit.enabled
            && (self.rate_limit.max_requests == 0 || self.rate_limit.window_seconds == 0)
        {
            return Err(AppError::configuration(
                "rate_limit.max_requests and rate_limit.window_seconds must be positive",
            ));
        }
        Ok(())
    }
}

/// A lifetime must be positive and no longer than `max`.
fn check_ttl(key: &str, value: i64, max: i64) -> Result<(), AppError> {
    if value <= 0 || value > max {
        return Err(AppError::configuration(format!(
            "{key} must be between 1 and {max}"
        )));
    }
    Ok(())
}
