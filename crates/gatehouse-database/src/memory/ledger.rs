//! In-memory refresh-token ledger.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use gatehouse_core::error::AppError;
use gatehouse_entity::token::RefreshTokenRecord;

use crate::traits::{LedgerError, RefreshTokenLedger};

#[derive(Debug, Default)]
struct InnerState {
    /// Records by id.
    records: HashMap<Uuid, RefreshTokenRecord>,
    /// Digest → record id. Mirrors the unique index on `token_hash`.
    by_hash: HashMap<String, Uuid>,
}

impl InnerState {
    fn insert(&mut self, record: &RefreshTokenRecord) -> Result<RefreshTokenRecord, LedgerError> {
        if self.by_hash.contains_key(&record.token_hash) || self.records.contains_key(&record.id) {
            return Err(LedgerError::Storage(AppError::conflict(
                "Unique constraint violated",
            )));
        }
        self.by_hash.insert(record.token_hash.clone(), record.id);
        self.records.insert(record.id, record.clone());
        Ok(record.clone())
    }

    fn valid_by_hash_mut(&mut self, token_hash: &str) -> Option<&mut RefreshTokenRecord> {
        let now = Utc::now();
        let id = self.by_hash.get(token_hash)?;
        self.records.get_mut(id).filter(|r| r.is_valid_at(now))
    }
}

/// Refresh-token ledger held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRefreshTokenLedger {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryRefreshTokenLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a record by id regardless of validity.
    pub async fn find_by_id(&self, id: Uuid) -> Option<RefreshTokenRecord> {
        self.state.lock().await.records.get(&id).cloned()
    }

    /// Total number of stored records, valid or not.
    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    /// Whether the ledger holds no records.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.records.is_empty()
    }
}

#[async_trait]
impl RefreshTokenLedger for MemoryRefreshTokenLedger {
    async fn create(&self, record: &RefreshTokenRecord) -> Result<RefreshTokenRecord, LedgerError> {
        self.state.lock().await.insert(record)
    }

    async fn get_by_hash(&self, token_hash: &str) -> Result<RefreshTokenRecord, LedgerError> {
        let state = self.state.lock().await;
        let record = state
            .by_hash
            .get(token_hash)
            .and_then(|id| state.records.get(id))
            .ok_or(LedgerError::NotFound)?;

        if record.is_expired_at(Utc::now()) {
            return Err(LedgerError::NotFound);
        }
        if record.is_revoked() {
            return Err(LedgerError::Revoked);
        }
        Ok(record.clone())
    }

    async fn revoke(&self, id: Uuid) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        match state.records.get_mut(&id) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(LedgerError::NotFound),
        }
    }

    async fn revoke_by_hash(&self, token_hash: &str) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        let id = *state.by_hash.get(token_hash).ok_or(LedgerError::NotFound)?;
        match state.records.get_mut(&id) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(LedgerError::NotFound),
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, LedgerError> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let mut revoked = 0u64;
        for record in state.records.values_mut() {
            if record.user_id == user_id && record.is_valid_at(now) {
                record.revoked_at = Some(now);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete_expired(&self) -> Result<u64, LedgerError> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let expired: Vec<RefreshTokenRecord> = state
            .records
            .values()
            .filter(|r| r.is_expired_at(now))
            .cloned()
            .collect();

        for record in &expired {
            state.records.remove(&record.id);
            state.by_hash.remove(&record.token_hash);
        }
        for record in state.records.values_mut() {
            if let Some(next) = record.replaced_by {
                if expired.iter().any(|e| e.id == next) {
                    record.replaced_by = None;
                }
            }
        }
        Ok(expired.len() as u64)
    }

    async fn rotate(
        &self,
        old_hash: &str,
        replacement: &RefreshTokenRecord,
    ) -> Result<RefreshTokenRecord, LedgerError> {
        let mut state = self.state.lock().await;

        if state.by_hash.contains_key(&replacement.token_hash) {
            return Err(LedgerError::Storage(AppError::conflict(
                "Unique constraint violated",
            )));
        }

        let old = state
            .valid_by_hash_mut(old_hash)
            .ok_or(LedgerError::NotFound)?;
        old.revoked_at = Some(Utc::now());
        old.replaced_by = Some(replacement.id);

        state.insert(replacement)
    }

    async fn list_active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RefreshTokenRecord>, LedgerError> {
        let now = Utc::now();
        let state = self.state.lock().await;
        let mut active: Vec<RefreshTokenRecord> = state
            .records
            .values()
            .filter(|r| r.user_id == user_id && r.is_valid_at(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }
}
