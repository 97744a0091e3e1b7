//! In-process refresh store
//!
//! Records live in per-family states, each behind its own mutex, so rotations
//! of unrelated families never contend beyond brief index map accesses.
//! A family mutex is always taken before any index lock, never the reverse.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::entities::token::{RefreshRecord, RevocationReason};
use crate::domain::value_objects::RefreshSecret;
use crate::errors::{RefreshError, StoreError};

use super::r#trait::{IssuedRefresh, RefreshStore};

#[derive(Debug)]
struct FamilyState {
    user_id: Uuid,
    records: Vec<RefreshRecord>,
}

impl FamilyState {
    /// A record counts as rotated once any record names it as parent, even
    /// after a later revocation overwrote its `Consumed` status.
    fn was_rotated(&self, record: &RefreshRecord) -> bool {
        record.is_consumed() || self.records.iter().any(|r| r.parent_id == Some(record.id))
    }

    fn revoke_all(&mut self, reason: RevocationReason, now: DateTime<Utc>) -> usize {
        self.records
            .iter_mut()
            .map(|r| r.revoke(now, reason))
            .filter(|changed| *changed)
            .count()
    }

    fn has_live(&self) -> bool {
        self.records.iter().any(RefreshRecord::is_live)
    }
}

type SharedFamily = Arc<Mutex<FamilyState>>;

/// Refresh store held entirely in memory
pub struct InMemoryRefreshStore {
    refresh_ttl: Duration,
    /// secret hash -> family id
    index: RwLock<HashMap<String, Uuid>>,
    families: RwLock<HashMap<Uuid, SharedFamily>>,
    /// user id -> family ids
    by_user: RwLock<HashMap<Uuid, HashSet<Uuid>>>,
}

impl InMemoryRefreshStore {
    pub fn new(refresh_ttl: Duration) -> Self {
        Self {
            refresh_ttl,
            index: RwLock::new(HashMap::new()),
            families: RwLock::new(HashMap::new()),
            by_user: RwLock::new(HashMap::new()),
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Number of families currently held
    pub async fn family_count(&self) -> usize {
        self.families.read().await.len()
    }

    async fn family(&self, family_id: Uuid) -> Option<SharedFamily> {
        self.families.read().await.get(&family_id).cloned()
    }

    async fn family_for_hash(&self, secret_hash: &str) -> Option<(Uuid, SharedFamily)> {
        let family_id = self.index.read().await.get(secret_hash).copied()?;
        let family = self.family(family_id).await?;
        Some((family_id, family))
    }
}

#[async_trait]
impl RefreshStore for InMemoryRefreshStore {
    async fn create_family(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<IssuedRefresh, StoreError> {
        let secret = RefreshSecret::generate();
        let record = RefreshRecord::new_family(user_id, secret.hash(), now, self.refresh_ttl);
        let family_id = record.family_id;

        let state = FamilyState {
            user_id,
            records: vec![record.clone()],
        };
        self.families
            .write()
            .await
            .insert(family_id, Arc::new(Mutex::new(state)));
        self.by_user
            .write()
            .await
            .entry(user_id)
            .or_default()
            .insert(family_id);
        self.index
            .write()
            .await
            .insert(record.secret_hash.clone(), family_id);

        debug!(family_id = %family_id, user_id = %user_id, "Created refresh family");
        Ok(IssuedRefresh { record, secret })
    }

    async fn rotate(&self, secret: &RefreshSecret, now: DateTime<Utc>) -> Result<IssuedRefresh, RefreshError> {
        let hash = secret.hash();
        let (family_id, family) = self.family_for_hash(&hash).await.ok_or(RefreshError::NotFound)?;

        let mut state = family.lock().await;
        let position = state
            .records
            .iter()
            .position(|r| r.secret_hash == hash)
            .ok_or(RefreshError::NotFound)?;

        let current = &state.records[position];
        // Ended sessions stay ended: only a replay revocation keeps
        // reporting reuse of its rotated secrets
        if matches!(current.revocation_reason(), Some(reason) if reason != RevocationReason::ReplayDetected) {
            return Err(RefreshError::Revoked);
        }
        if state.was_rotated(current) {
            let record_id = current.id;
            let user_id = state.user_id;
            let revoked = state.revoke_all(RevocationReason::ReplayDetected, now);
            warn!(
                family_id = %family_id,
                user_id = %user_id,
                record_id = %record_id,
                revoked,
                "Refresh secret replay detected, family revoked"
            );
            return Err(RefreshError::AlreadyConsumed);
        }
        if current.is_revoked() {
            return Err(RefreshError::Revoked);
        }
        if current.is_expired_at(now) {
            return Err(RefreshError::Expired);
        }

        let next_secret = RefreshSecret::generate();
        let successor = current.successor(next_secret.hash(), now, self.refresh_ttl);
        state.records[position].consume(now, successor.id);
        state.records.push(successor.clone());

        self.index
            .write()
            .await
            .insert(successor.secret_hash.clone(), family_id);
        drop(state);

        debug!(family_id = %family_id, record_id = %successor.id, "Rotated refresh secret");
        Ok(IssuedRefresh {
            record: successor,
            secret: next_secret,
        })
    }

    async fn revoke_family(
        &self,
        family_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let family = match self.family(family_id).await {
            Some(family) => family,
            None => return Ok(0),
        };
        let revoked = family.lock().await.revoke_all(reason, now);
        Ok(revoked)
    }

    async fn revoke_family_containing(
        &self,
        secret: &RefreshSecret,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, StoreError> {
        let hash = secret.hash();
        let (family_id, family) = match self.family_for_hash(&hash).await {
            Some(found) => found,
            None => return Ok(None),
        };

        let mut state = family.lock().await;
        if !state.records.iter().any(|r| r.secret_hash == hash) {
            return Ok(None);
        }
        state.revoke_all(reason, now);
        Ok(Some(family_id))
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let family_ids: Vec<Uuid> = match self.by_user.read().await.get(&user_id) {
            Some(ids) => ids.iter().copied().collect(),
            None => return Ok(0),
        };

        let mut ended = 0;
        for family_id in family_ids {
            if let Some(family) = self.family(family_id).await {
                let mut state = family.lock().await;
                let had_live = state.has_live();
                state.revoke_all(RevocationReason::UserSignOut, now);
                if had_live {
                    ended += 1;
                }
            }
        }
        Ok(ended)
    }

    async fn family_records(&self, family_id: Uuid) -> Result<Vec<RefreshRecord>, StoreError> {
        match self.family(family_id).await {
            Some(family) => Ok(family.lock().await.records.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let snapshot: Vec<(Uuid, SharedFamily)> = self
            .families
            .read()
            .await
            .iter()
            .map(|(id, family)| (*id, Arc::clone(family)))
            .collect();

        let mut purged = 0;
        for (family_id, family) in snapshot {
            let mut state = family.lock().await;
            let (expired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.records)
                .into_iter()
                .partition(|r| r.is_expired_at(now));
            state.records = kept;

            if expired.is_empty() {
                continue;
            }
            purged += expired.len();

            {
                let mut index = self.index.write().await;
                for record in &expired {
                    index.remove(&record.secret_hash);
                }
            }

            if state.records.is_empty() {
                self.families.write().await.remove(&family_id);
                let mut by_user = self.by_user.write().await;
                if let Some(ids) = by_user.get_mut(&state.user_id) {
                    ids.remove(&family_id);
                    if ids.is_empty() {
                        by_user.remove(&state.user_id);
                    }
                }
            }
        }

        if purged > 0 {
            debug!(purged, "Purged expired refresh records");
        }
        Ok(purged)
    }
}
