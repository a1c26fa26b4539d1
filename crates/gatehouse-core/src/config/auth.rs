//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Minimum accepted length of the HMAC signing secret, in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

/// Longest accepted access-token lifetime: one day.
pub const MAX_ACCESS_TTL_MINUTES: i64 = 24 * 60;

/// Longest accepted refresh-token lifetime: one year.
pub const MAX_REFRESH_TTL_HOURS: i64 = 365 * 24;

/// Longest accepted password-reset lifetime: one day.
pub const MAX_RESET_TTL_MINUTES: i64 = 24 * 60;

/// Authentication and credential configuration.
///
/// The signing secret is read once at startup and handed to the token
/// codec by value; nothing else holds on to it.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Value of the `iss` claim on every token.
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: i64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_hours: i64,
    /// Password-reset token TTL in minutes.
    #[serde(default = "default_reset_ttl")]
    pub reset_token_ttl_minutes: i64,
    /// Entropy of password-reset tokens in bytes.
    #[serde(default = "default_reset_bytes")]
    pub reset_token_bytes: usize,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_hours", &self.refresh_token_ttl_hours)
            .field("reset_token_ttl_minutes", &self.reset_token_ttl_minutes)
            .field("reset_token_bytes", &self.reset_token_bytes)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_issuer: default_issuer(),
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_hours: default_refresh_ttl(),
            reset_token_ttl_minutes: default_reset_ttl(),
            reset_token_bytes: default_reset_bytes(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_issuer() -> String {
    "service".to_string()
}

fn default_access_ttl() -> i64 {
    60
}

fn default_refresh_ttl() -> i64 {
    720
}

fn default_reset_ttl() -> i64 {
    60
}

fn default_reset_bytes() -> usize {
    32
}
