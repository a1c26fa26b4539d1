//! Claims carried by access and refresh tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived token presented on API requests.
    Access,
    /// Long-lived, single-use token redeemed for a new pair.
    Refresh,
}

/// Claims as they appear on the wire.
///
/// `user_id` stays a string here so that a malformed identifier is reported
/// only after the signature and expiry have been checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireClaims {
    pub user_id: String,
    pub email: String,
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub token_type: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Validated claims of an access or refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// The identity the token was issued to. Equal to the subject.
    pub user_id: Uuid,
    /// Email of the identity at issuance.
    pub email: String,
    /// Issuer.
    pub issuer: String,
    /// Issued-at, seconds since epoch.
    pub issued_at: i64,
    /// Not-before, seconds since epoch.
    pub not_before: i64,
    /// Expiry, seconds since epoch.
    pub expires_at: i64,
    /// Access or refresh.
    pub kind: TokenKind,
    /// Unique token id. Present on refresh tokens.
    pub jti: Option<String>,
}

impl Claims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// Returns the remaining TTL in seconds (0 if expired).
    pub fn remaining_ttl_seconds(&self) -> u64 {
        let remaining = self.expires_at - Utc::now().timestamp();
        if remaining > 0 { remaining as u64 } else { 0 }
    }
}
