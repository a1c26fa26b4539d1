//! In-memory identity store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use gatehouse_core::error::AppError;
use gatehouse_core::result::AppResult;
use gatehouse_entity::identity::Identity;

use crate::traits::IdentityStore;

/// Identity store held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityStore {
    identities: Arc<Mutex<HashMap<Uuid, Identity>>>,
}

impl MemoryIdentityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities.
    pub async fn len(&self) -> usize {
        self.identities.lock().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.identities.lock().await.is_empty()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Identity>> {
        Ok(self.identities.lock().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>> {
        let identities = self.identities.lock().await;
        Ok(identities.values().find(|i| i.email == email).cloned())
    }

    async fn find_by_reset_token_hash(&self, token_hash: &str) -> AppResult<Option<Identity>> {
        let identities = self.identities.lock().await;
        Ok(identities
            .values()
            .find(|i| i.reset_token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn create(&self, identity: &Identity) -> AppResult<Identity> {
        let mut identities = self.identities.lock().await;
        if identities.values().any(|i| i.email == identity.email) {
            return Err(AppError::conflict("Unique constraint violated"));
        }
        if identities.contains_key(&identity.id) {
            return Err(AppError::conflict("Duplicate identity id"));
        }
        identities.insert(identity.id, identity.clone());
        Ok(identity.clone())
    }

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(identity) = self.identities.lock().await.get_mut(&id) {
            identity.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut identities = self.identities.lock().await;
        let identity = identities
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Identity not found"))?;
        identity.password_hash = password_hash.to_string();
        identity.updated_at = Utc::now();
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        if let Some(identity) = self.identities.lock().await.get_mut(&id) {
            identity.reset_token_hash = Some(token_hash.to_string());
            identity.reset_token_expires_at = Some(expires_at);
            identity.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn complete_password_reset(
        &self,
        id: Uuid,
        password_hash: &str,
        consumed_hash: &str,
    ) -> AppResult<bool> {
        let mut identities = self.identities.lock().await;
        match identities.get_mut(&id) {
            Some(identity) if identity.reset_token_hash.as_deref() == Some(consumed_hash) => {
                identity.password_hash = password_hash.to_string();
                identity.reset_token_hash = None;
                identity.reset_token_expires_at = None;
                identity.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<()> {
        if let Some(identity) = self.identities.lock().await.get_mut(&id) {
            identity.is_active = active;
            identity.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gatehouse_core::error::ErrorKind;
    use gatehouse_entity::identity::CreateIdentity;

    fn identity(email: &str) -> Identity {
        Identity::from_create(CreateIdentity {
            email: email.to_string(),
            password_hash: "hash".to_string(),
        })
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryIdentityStore::new();
        store.create(&identity("a@example.com")).await.unwrap();
        let err = store.create(&identity("a@example.com")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_reset_completion_is_single_use() {
        let store = MemoryIdentityStore::new();
        let user = store.create(&identity("b@example.com")).await.unwrap();
        store
            .set_reset_token(user.id, "digest", Utc::now() + Duration::minutes(10))
            .await
            .unwrap();

        let found = store.find_by_reset_token_hash("digest").await.unwrap();
        assert_eq!(found.map(|i| i.id), Some(user.id));

        assert!(store.complete_password_reset(user.id, "new", "digest").await.unwrap());
        assert!(!store.complete_password_reset(user.id, "newer", "digest").await.unwrap());

        let after = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(after.password_hash, "new");
        assert!(after.reset_token_hash.is_none());
        assert!(after.reset_token_expires_at.is_none());
    }

    #[tokio::test]
    async fn test_newer_reset_token_supersedes_older() {
        let store = MemoryIdentityStore::new();
        let user = store.create(&identity("c@example.com")).await.unwrap();
        let exp = Utc::now() + Duration::minutes(10);
        store.set_reset_token(user.id, "first", exp).await.unwrap();
        store.set_reset_token(user.id, "second", exp).await.unwrap();

        assert!(store.find_by_reset_token_hash("first").await.unwrap().is_none());
        assert!(store.find_by_reset_token_hash("second").await.unwrap().is_some());
    }
}
