//! Identity entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Identity {
    /// Unique identifier.
    pub id: Uuid,
    /// Normalized (trimmed, lowercase) email address. Unique.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the account may authenticate.
    pub is_active: bool,
    /// SHA-256 hex digest of the outstanding password-reset token.
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    /// When the outstanding password-reset token stops being redeemable.
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Build a fresh, active identity from creation data.
    pub fn from_create(data: CreateIdentity) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: data.email,
            password_hash: data.password_hash,
            is_active: true,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    /// The caller-facing view of this identity.
    pub fn to_public(&self) -> PublicIdentity {
        PublicIdentity {
            id: self.id,
            email: self.email.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        }
    }

    /// Whether the stored reset token is still inside its validity window.
    ///
    /// A missing expiry counts as expired, never as "no restriction".
    pub fn reset_token_is_live(&self, now: DateTime<Utc>) -> bool {
        matches!(self.reset_token_expires_at, Some(exp) if now < exp)
    }
}

/// Public identity view returned to callers. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIdentity {
    /// Identifier.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Whether the account is active.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Data required to create a new identity.
#[derive(Debug, Clone)]
pub struct CreateIdentity {
    /// Normalized email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
}

/// Normalize an email for storage and lookup: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn identity() -> Identity {
        Identity::from_create(CreateIdentity {
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
        })
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email("bob@example.com"), "bob@example.com");
    }

    #[test]
    fn test_public_view_omits_credentials() {
        let mut user = identity();
        user.reset_token_hash = Some("abc".to_string());
        let public = user.to_public();
        assert_eq!(public.id, user.id);
        assert_eq!(public.email, "alice@example.com");
    }

    #[test]
    fn test_serialization_skips_secrets() {
        let mut user = identity();
        user.reset_token_hash = Some("deadbeef".to_string());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("reset_token_hash"));
    }

    #[test]
    fn test_reset_token_liveness() {
        let now = Utc::now();
        let mut user = identity();
        assert!(!user.reset_token_is_live(now));

        user.reset_token_expires_at = Some(now + Duration::minutes(5));
        assert!(user.reset_token_is_live(now));

        user.reset_token_expires_at = Some(now - Duration::seconds(1));
        assert!(!user.reset_token_is_live(now));
    }
}
