//! Identity persistence contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gatehouse_core::result::AppResult;
use gatehouse_entity::identity::Identity;

/// Storage for identities.
///
/// Emails are stored already normalized. Implementations must enforce email
/// uniqueness themselves and report a duplicate insert as an error whose
/// kind is `ErrorKind::Conflict`.
#[async_trait]
pub trait IdentityStore: Send + Sync + std::fmt::Debug {
    /// Find an identity by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Identity>>;

    /// Find an identity by normalized email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>>;

    /// Find the identity holding the given reset-token digest.
    async fn find_by_reset_token_hash(&self, token_hash: &str) -> AppResult<Option<Identity>>;

    /// Insert a new identity.
    async fn create(&self, identity: &Identity) -> AppResult<Identity>;

    /// Record a successful login.
    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    /// Replace the password hash.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

    /// Store a new reset-token digest and expiry, superseding any earlier one.
    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Set the new password and clear the reset-token fields, but only if the
    /// identity still holds `consumed_hash`.
    ///
    /// Returns `false` when the token was already consumed or superseded.
    async fn complete_password_reset(
        &self,
        id: Uuid,
        password_hash: &str,
        consumed_hash: &str,
    ) -> AppResult<bool>;

    /// Activate or deactivate an identity.
    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<()>;
}
