//! Refresh store double whose backend can be switched off, for testing

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::domain::entities::token::{RefreshRecord, RevocationReason};
use crate::domain::value_objects::RefreshSecret;
use crate::errors::{RefreshError, StoreError};

use super::memory::InMemoryRefreshStore;
use super::r#trait::{IssuedRefresh, RefreshStore};

/// In-memory store that fails every call with `StoreError::Unavailable`
/// while `set_unavailable(true)` is in effect
pub struct MockRefreshStore {
    inner: InMemoryRefreshStore,
    unavailable: AtomicBool,
}

impl MockRefreshStore {
    pub fn new(refresh_ttl: Duration) -> Self {
        Self {
            inner: InMemoryRefreshStore::new(refresh_ttl),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "connection pool timed out".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RefreshStore for MockRefreshStore {
    async fn create_family(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<IssuedRefresh, StoreError> {
        self.check()?;
        self.inner.create_family(user_id, now).await
    }

    async fn rotate(&self, secret: &RefreshSecret, now: DateTime<Utc>) -> Result<IssuedRefresh, RefreshError> {
        self.check()?;
        self.inner.rotate(secret, now).await
    }

    async fn revoke_family(
        &self,
        family_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.revoke_family(family_id, reason, now).await
    }

    async fn revoke_family_containing(
        &self,
        secret: &RefreshSecret,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, StoreError> {
        self.check()?;
        self.inner.revoke_family_containing(secret, reason, now).await
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.revoke_all_for_user(user_id, now).await
    }

    async fn family_records(&self, family_id: Uuid) -> Result<Vec<RefreshRecord>, StoreError> {
        self.check()?;
        self.inner.family_records(family_id).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.purge_expired(now).await
    }
}
