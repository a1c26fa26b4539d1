//! Refresh-token record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted refresh token.
///
/// Only the SHA-256 digest of the token string is stored. A record is valid
/// while it has not been revoked and its expiry lies in the future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RefreshTokenRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// The identity this token was issued to.
    pub user_id: Uuid,
    /// Hex SHA-256 digest of the raw refresh token.
    pub token_hash: String,
    /// When the token stops being redeemable.
    pub expires_at: DateTime<Utc>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was revoked, if it was.
    pub revoked_at: Option<DateTime<Utc>>,
    /// The record issued when this one was rotated out.
    pub replaced_by: Option<Uuid>,
    /// User-Agent header of the issuing request.
    pub user_agent: Option<String>,
    /// Source address of the issuing request.
    pub ip_address: Option<String>,
}

impl RefreshTokenRecord {
    /// Build a new, unrevoked record.
    pub fn new(
        user_id: Uuid,
        token_hash: String,
        expires_at: DateTime<Utc>,
        client: &ClientMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            expires_at,
            created_at: Utc::now(),
            revoked_at: None,
            replaced_by: None,
            user_agent: client.user_agent.clone(),
            ip_address: client.ip_address.clone(),
        }
    }

    /// Check whether the record is revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Check whether the record has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check whether the record is valid at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }
}

/// Audit metadata about the client a token was issued to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    /// User-Agent header.
    pub user_agent: Option<String>,
    /// Source address.
    pub ip_address: Option<String>,
}

impl ClientMetadata {
    /// Construct metadata from optional request attributes.
    pub fn new(user_agent: Option<String>, ip_address: Option<String>) -> Self {
        Self {
            user_agent,
            ip_address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let mut record = RefreshTokenRecord::new(
            Uuid::new_v4(),
            "digest".to_string(),
            now + Duration::hours(1),
            &ClientMetadata::default(),
        );
        assert!(record.is_valid_at(now));
        assert!(!record.is_valid_at(now + Duration::hours(1)));

        record.revoked_at = Some(now);
        assert!(!record.is_valid_at(now));
        assert!(record.is_revoked());
    }

    #[test]
    fn test_new_records_get_distinct_ids() {
        let client = ClientMetadata::new(Some("curl/8".to_string()), None);
        let exp = Utc::now() + Duration::hours(1);
        let a = RefreshTokenRecord::new(Uuid::nil(), "a".to_string(), exp, &client);
        let b = RefreshTokenRecord::new(Uuid::nil(), "b".to_string(), exp, &client);
        assert_ne!(a.id, b.id);
        assert_eq!(a.user_agent.as_deref(), Some("curl/8"));
    }
}
