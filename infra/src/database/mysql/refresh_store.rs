//! MySQL implementation of the RefreshStore trait.
//!
//! Rotation runs inside a transaction that row-locks the presented record
//! with `SELECT ... FOR UPDATE`. The `Live -> Consumed` transition is an
//! `UPDATE ... WHERE status = 'live'` whose affected-row count is the
//! compare-and-set, and replay revocation commits in the same transaction
//! that detected it.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Row, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use wl_core::domain::entities::token::{RefreshRecord, RefreshStatus, RevocationReason};
use wl_core::domain::value_objects::RefreshSecret;
use wl_core::errors::{RefreshError, StoreError};
use wl_core::repositories::{IssuedRefresh, RefreshStore};

const SELECT_RECORD: &str = r#"
    SELECT id, user_id, family_id, secret_hash, parent_id, issued_at, expires_at,
           status, consumed_at, successor_id, revoked_at, revocation_reason
    FROM refresh_records
"#;

/// MySQL implementation of RefreshStore
pub struct MySqlRefreshStore {
    /// Database connection pool
    pool: MySqlPool,
    /// Lifetime of every record created or rotated through this store
    refresh_ttl: Duration,
}

impl MySqlRefreshStore {
    /// Create a new MySQL refresh store
    ///
    /// # Arguments
    /// * `pool` - MySQL connection pool from SQLx
    /// * `refresh_ttl` - Lifetime of newly issued refresh records
    pub fn new(pool: MySqlPool, refresh_ttl: Duration) -> Self {
        Self { pool, refresh_ttl }
    }

    /// Convert database row to RefreshRecord entity
    fn row_to_record(row: &MySqlRow) -> Result<RefreshRecord, StoreError> {
        let status: String = get(row, "status")?;
        let status = match status.as_str() {
            "live" => RefreshStatus::Live,
            "consumed" => RefreshStatus::Consumed {
                at: get(row, "consumed_at")?,
                successor_id: parse_uuid(&get::<String>(row, "successor_id")?)?,
            },
            "revoked" => {
                let reason: String = get(row, "revocation_reason")?;
                RefreshStatus::Revoked {
                    at: get(row, "revoked_at")?,
                    reason: reason
                        .parse::<RevocationReason>()
                        .map_err(|message| StoreError::Corrupt { message })?,
                }
            }
            other => {
                return Err(StoreError::Corrupt {
                    message: format!("Unknown refresh record status: {}", other),
                })
            }
        };

        let parent_id: Option<String> = get(row, "parent_id")?;

        Ok(RefreshRecord {
            id: parse_uuid(&get::<String>(row, "id")?)?,
            user_id: parse_uuid(&get::<String>(row, "user_id")?)?,
            family_id: parse_uuid(&get::<String>(row, "family_id")?)?,
            secret_hash: get(row, "secret_hash")?,
            issued_at: get(row, "issued_at")?,
            expires_at: get(row, "expires_at")?,
            status,
            parent_id: parent_id.as_deref().map(parse_uuid).transpose()?,
        })
    }

    async fn insert_record(
        tx: &mut Transaction<'_, MySql>,
        record: &RefreshRecord,
    ) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO refresh_records (
                id, user_id, family_id, secret_hash, parent_id, issued_at, expires_at, status
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 'live')
        "#;

        sqlx::query(query)
            .bind(record.id.to_string())
            .bind(record.user_id.to_string())
            .bind(record.family_id.to_string())
            .bind(&record.secret_hash)
            .bind(record.parent_id.map(|id| id.to_string()))
            .bind(record.issued_at)
            .bind(record.expires_at)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn revoke_family_in(
        tx: &mut Transaction<'_, MySql>,
        family_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        // consumed_at and successor_id are kept: they still mark the record as rotated
        let query = r#"
            UPDATE refresh_records
            SET status = 'revoked', revoked_at = ?, revocation_reason = ?
            WHERE family_id = ? AND status <> 'revoked'
        "#;

        let result = sqlx::query(query)
            .bind(now)
            .bind(reason.as_str())
            .bind(family_id.to_string())
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() as usize)
    }

    async fn begin(&self) -> Result<Transaction<'_, MySql>, StoreError> {
        self.pool.begin().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl RefreshStore for MySqlRefreshStore {
    async fn create_family(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<IssuedRefresh, StoreError> {
        let secret = RefreshSecret::generate();
        let record = RefreshRecord::new_family(user_id, secret.hash(), now, self.refresh_ttl);

        let mut tx = self.begin().await?;
        Self::insert_record(&mut tx, &record).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(family_id = %record.family_id, user_id = %user_id, "Created refresh family");
        Ok(IssuedRefresh { record, secret })
    }

    async fn rotate(&self, secret: &RefreshSecret, now: DateTime<Utc>) -> Result<IssuedRefresh, RefreshError> {
        let hash = secret.hash();
        let mut tx = self.begin().await?;

        let query = format!("{} WHERE secret_hash = ? FOR UPDATE", SELECT_RECORD);
        let row = sqlx::query(&query)
            .bind(&hash)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RefreshError::NotFound)?;

        let record = Self::row_to_record(&row)?;
        // status = 'revoked' AND revocation_reason <> 'replay_detected'
        if matches!(record.revocation_reason(), Some(reason) if reason != RevocationReason::ReplayDetected) {
            return Err(RefreshError::Revoked);
        }
        let rotated = get::<Option<String>>(&row, "successor_id")?.is_some();

        if rotated {
            let revoked =
                Self::revoke_family_in(&mut tx, record.family_id, RevocationReason::ReplayDetected, now).await?;
            tx.commit().await.map_err(map_sqlx_error)?;
            warn!(
                family_id = %record.family_id,
                user_id = %record.user_id,
                record_id = %record.id,
                revoked,
                "Refresh secret replay detected, family revoked"
            );
            return Err(RefreshError::AlreadyConsumed);
        }
        if record.is_revoked() {
            return Err(RefreshError::Revoked);
        }
        if record.is_expired_at(now) {
            return Err(RefreshError::Expired);
        }

        let next_secret = RefreshSecret::generate();
        let successor = record.successor(next_secret.hash(), now, self.refresh_ttl);

        let consumed = sqlx::query(
            r#"
            UPDATE refresh_records
            SET status = 'consumed', consumed_at = ?, successor_id = ?
            WHERE id = ? AND status = 'live'
            "#,
        )
        .bind(now)
        .bind(successor.id.to_string())
        .bind(record.id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if consumed.rows_affected() != 1 {
            Self::revoke_family_in(&mut tx, record.family_id, RevocationReason::ReplayDetected, now).await?;
            tx.commit().await.map_err(map_sqlx_error)?;
            warn!(family_id = %record.family_id, user_id = %record.user_id, "Lost rotation race, family revoked");
            return Err(RefreshError::AlreadyConsumed);
        }

        Self::insert_record(&mut tx, &successor).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(family_id = %successor.family_id, record_id = %successor.id, "Rotated refresh secret");
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
        let mut tx = self.begin().await?;
        let revoked = Self::revoke_family_in(&mut tx, family_id, reason, now).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(revoked)
    }

    async fn revoke_family_containing(
        &self,
        secret: &RefreshSecret,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, StoreError> {
        let mut tx = self.begin().await?;

        let row = sqlx::query("SELECT family_id FROM refresh_records WHERE secret_hash = ? FOR UPDATE")
            .bind(secret.hash())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let family_id = match row {
            Some(row) => parse_uuid(&get::<String>(&row, "family_id")?)?,
            None => return Ok(None),
        };

        Self::revoke_family_in(&mut tx, family_id, reason, now).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(Some(family_id))
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut tx = self.begin().await?;

        let live_families: i64 = sqlx::query(
            r#"
            SELECT COUNT(DISTINCT family_id) AS live_families
            FROM refresh_records
            WHERE user_id = ? AND status = 'live'
            FOR UPDATE
            "#,
        )
        .bind(user_id.to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)
        .and_then(|row| get(&row, "live_families"))?;

        sqlx::query(
            r#"
            UPDATE refresh_records
            SET status = 'revoked', revoked_at = ?, revocation_reason = ?
            WHERE user_id = ? AND status <> 'revoked'
            "#,
        )
        .bind(now)
        .bind(RevocationReason::UserSignOut.as_str())
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(live_families as usize)
    }

    async fn family_records(&self, family_id: Uuid) -> Result<Vec<RefreshRecord>, StoreError> {
        let query = format!("{} WHERE family_id = ? ORDER BY issued_at, id", SELECT_RECORD);
        let rows = sqlx::query(&query)
            .bind(family_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_records WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() as usize)
    }
}

/// Transient pool and connection failures are `Unavailable`; everything
/// else is a backend error.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable {
                message: err.to_string(),
            }
        }
        other => StoreError::Backend {
            message: other.to_string(),
        },
    }
}

fn get<'r, T>(row: &'r MySqlRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get(column).map_err(|e| StoreError::Corrupt {
        message: format!("Failed to get {}: {}", column, e),
    })
}

fn parse_uuid(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|e| StoreError::Corrupt {
        message: format!("Invalid UUID {}: {}", raw, e),
    })
}
