//! Refresh store trait defining the interface for refresh record persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::token::{RefreshRecord, RevocationReason};
use crate::domain::value_objects::RefreshSecret;
use crate::errors::{RefreshError, StoreError};

/// A freshly created live record together with the plaintext secret that
/// unlocks it. The secret exists only here; the store keeps its hash.
#[derive(Debug, Clone)]
pub struct IssuedRefresh {
    pub record: RefreshRecord,
    pub secret: RefreshSecret,
}

/// Store of refresh records grouped into rotation families
///
/// Every operation is atomic with respect to concurrent callers touching the
/// same family. Implementations must keep at most one `Live` record per
/// family.
///
/// # Security Considerations
/// - Only secret hashes are stored
/// - Replay of a consumed secret revokes the family in the same critical
///   section that detects it
#[async_trait]
pub trait RefreshStore: Send + Sync {
    /// Starts a new family for `user_id` with one live record
    async fn create_family(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<IssuedRefresh, StoreError>;

    /// Consumes the record behind `secret` and issues its live successor
    ///
    /// Checks, in order:
    /// * revoked for any reason but replay (logout, sign-out, aborted
    ///   issuance) - fails `Revoked`
    /// * consumed - the whole family is revoked, fails `AlreadyConsumed`
    /// * revoked - fails `Revoked`
    /// * expired - fails `Expired`
    ///
    /// Of N concurrent rotations of one secret exactly one succeeds and the
    /// rest observe `AlreadyConsumed`.
    async fn rotate(&self, secret: &RefreshSecret, now: DateTime<Utc>) -> Result<IssuedRefresh, RefreshError>;

    /// Revokes every record of the family. Idempotent.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records whose status changed
    async fn revoke_family(
        &self,
        family_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    /// Revokes the family owning `secret`
    ///
    /// # Returns
    /// * `Ok(Some(family_id))` - The family was found (and is now revoked)
    /// * `Ok(None)` - No record matches the secret
    async fn revoke_family_containing(
        &self,
        secret: &RefreshSecret,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, StoreError>;

    /// Revokes every family of a user
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of families that still had a live record
    async fn revoke_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<usize, StoreError>;

    /// All records of a family, oldest first
    async fn family_records(&self, family_id: Uuid) -> Result<Vec<RefreshRecord>, StoreError>;

    /// Deletes records with `expires_at <= now` and drops families left empty
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records deleted
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}
