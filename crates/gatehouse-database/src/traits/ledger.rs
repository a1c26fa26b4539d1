//! Refresh-token ledger contract.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use gatehouse_core::error::AppError;
use gatehouse_entity::token::RefreshTokenRecord;

/// Failures reported by a [`RefreshTokenLedger`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No valid record matched. Expired records are reported this way too.
    #[error("refresh token not found")]
    NotFound,
    /// The record exists but was explicitly revoked.
    #[error("refresh token revoked")]
    Revoked,
    /// The backing store failed.
    #[error(transparent)]
    Storage(#[from] AppError),
}

/// Persistence for refresh-token records, keyed by token digest.
///
/// Every revoking operation is a conditional update ("revoke iff still not
/// revoked"); its affected-row count decides success, so concurrent callers
/// racing on the same record see exactly one winner.
#[async_trait]
pub trait RefreshTokenLedger: Send + Sync + std::fmt::Debug {
    /// Insert a new record.
    async fn create(&self, record: &RefreshTokenRecord) -> Result<RefreshTokenRecord, LedgerError>;

    /// Look up a record by digest.
    ///
    /// Absent and expired records yield `NotFound`; revoked ones `Revoked`.
    async fn get_by_hash(&self, token_hash: &str) -> Result<RefreshTokenRecord, LedgerError>;

    /// Revoke a record by id. `NotFound` if absent or already revoked.
    async fn revoke(&self, id: Uuid) -> Result<(), LedgerError>;

    /// Revoke a record by digest. `NotFound` if absent or already revoked.
    async fn revoke_by_hash(&self, token_hash: &str) -> Result<(), LedgerError>;

    /// Revoke every valid record of a user. Zero matches is not an error.
    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, LedgerError>;

    /// Remove records past their expiry. Returns the number removed.
    async fn delete_expired(&self) -> Result<u64, LedgerError>;

    /// Atomically retire the valid record with digest `old_hash` and insert
    /// `replacement`, linking the old record's `replaced_by` to it.
    ///
    /// If the old record is no longer valid (absent, expired, or revoked by a
    /// concurrent caller) nothing is written and `NotFound` is returned.
    async fn rotate(
        &self,
        old_hash: &str,
        replacement: &RefreshTokenRecord,
    ) -> Result<RefreshTokenRecord, LedgerError>;

    /// List the valid records of a user, newest first.
    async fn list_active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RefreshTokenRecord>, LedgerError>;
}
