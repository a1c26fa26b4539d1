//! Refresh-token ledger backed by PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use gatehouse_core::error::{AppError, ErrorKind};
use gatehouse_entity::token::RefreshTokenRecord;

use crate::traits::{LedgerError, RefreshTokenLedger};

const INSERT_SQL: &str = "INSERT INTO refresh_tokens \
     (id, user_id, token_hash, expires_at, created_at, revoked_at, replaced_by, user_agent, ip_address) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *";

/// PostgreSQL refresh-token ledger.
#[derive(Debug, Clone)]
pub struct PgRefreshTokenLedger {
    pool: PgPool,
}

impl PgRefreshTokenLedger {
    /// Create a new ledger over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_in(
        tx: &mut Transaction<'_, Postgres>,
        record: &RefreshTokenRecord,
    ) -> Result<RefreshTokenRecord, LedgerError> {
        sqlx::query_as::<_, RefreshTokenRecord>(INSERT_SQL)
            .bind(record.id)
            .bind(record.user_id)
            .bind(&record.token_hash)
            .bind(record.expires_at)
            .bind(record.created_at)
            .bind(record.revoked_at)
            .bind(record.replaced_by)
            .bind(&record.user_agent)
            .bind(&record.ip_address)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| LedgerError::Storage(AppError::from(e)))
    }
}

fn storage(message: &'static str) -> impl FnOnce(sqlx::Error) -> LedgerError {
    move |e| LedgerError::Storage(AppError::with_source(ErrorKind::Database, message, e))
}

#[async_trait]
impl RefreshTokenLedger for PgRefreshTokenLedger {
    async fn create(&self, record: &RefreshTokenRecord) -> Result<RefreshTokenRecord, LedgerError> {
        sqlx::query_as::<_, RefreshTokenRecord>(INSERT_SQL)
            .bind(record.id)
            .bind(record.user_id)
            .bind(&record.token_hash)
            .bind(record.expires_at)
            .bind(record.created_at)
            .bind(record.revoked_at)
            .bind(record.replaced_by)
            .bind(&record.user_agent)
            .bind(&record.ip_address)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(AppError::from(e)))
    }

    async fn get_by_hash(&self, token_hash: &str) -> Result<RefreshTokenRecord, LedgerError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT * FROM refresh_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("Failed to look up refresh token"))?
        .ok_or(LedgerError::NotFound)?;

        if record.is_expired_at(Utc::now()) {
            return Err(LedgerError::NotFound);
        }
        if record.is_revoked() {
            return Err(LedgerError::Revoked);
        }
        Ok(record)
    }

    async fn revoke(&self, id: Uuid) -> Result<(), LedgerError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(storage("Failed to revoke refresh token"))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound);
        }
        Ok(())
    }

    async fn revoke_by_hash(&self, token_hash: &str) -> Result<(), LedgerError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() \
             WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .map_err(storage("Failed to revoke refresh token"))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound);
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, LedgerError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() \
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > NOW()",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(storage("Failed to revoke user refresh tokens"))?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> Result<u64, LedgerError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(storage("Failed to delete expired refresh tokens"))?;

        Ok(result.rows_affected())
    }

    async fn rotate(
        &self,
        old_hash: &str,
        replacement: &RefreshTokenRecord,
    ) -> Result<RefreshTokenRecord, LedgerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(storage("Failed to begin rotation"))?;

        let revoked = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW(), replaced_by = $2 \
             WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > NOW()",
        )
        .bind(old_hash)
        .bind(replacement.id)
        .execute(&mut *tx)
        .await
        .map_err(storage("Failed to retire refresh token"))?;

        if revoked.rows_affected() != 1 {
            debug!("Rotation lost: old refresh token no longer valid");
            tx.rollback()
                .await
                .map_err(storage("Failed to roll back rotation"))?;
            return Err(LedgerError::NotFound);
        }

        let inserted = Self::insert_in(&mut tx, replacement).await?;

        tx.commit()
            .await
            .map_err(storage("Failed to commit rotation"))?;

        Ok(inserted)
    }

    async fn list_active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RefreshTokenRecord>, LedgerError> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT * FROM refresh_tokens \
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > NOW() \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("Failed to list refresh tokens"))
    }
}
