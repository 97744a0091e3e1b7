//! Token entities: access credential claims and refresh records.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default access token lifetime (15 minutes)
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 15 * 60;

/// Default refresh token lifetime (7 days)
pub const REFRESH_TOKEN_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

/// JWT issuer
pub const JWT_ISSUER: &str = "wearly";

/// JWT audience
pub const JWT_AUDIENCE: &str = "wearly-api";

/// Claims structure for the access credential payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// JWT ID, a random nonce making every credential unique
    pub jti: String,
}

impl Claims {
    /// Creates access credential claims for `user_id` issued at `now`
    pub fn new_access_token(
        user_id: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let iat = now.timestamp();
        Self {
            sub: user_id.to_string(),
            iat,
            exp: iat + ttl.num_seconds(),
            nbf: iat,
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// `true` once `now` has reached the expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Gets the user ID from the claims
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp_to_datetime(self.exp)
    }

    /// Issue instant as a timestamp
    pub fn issued_at(&self) -> DateTime<Utc> {
        timestamp_to_datetime(self.iat)
    }
}

/// A signed, self-contained access credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCredential {
    /// Compact JWS representation handed to the client
    pub token: String,

    /// Subject of the credential
    pub user_id: Uuid,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

impl AccessCredential {
    /// Seconds of validity left at `now`, zero once expired
    pub fn expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Result of a successful access credential verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenValidationMeta {
    /// Owner of the credential
    pub user_id: Uuid,

    /// Instant after which the credential stops verifying
    pub expires_at: DateTime<Utc>,

    /// JWT ID of the verified credential
    pub token_id: String,
}

/// Why a refresh record was revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// The session was ended by the user
    Logout,
    /// A consumed secret was presented again
    ReplayDetected,
    /// Every session of the user was ended
    UserSignOut,
    /// Issuance failed after the record was created
    IssuanceAborted,
}

impl RevocationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationReason::Logout => "logout",
            RevocationReason::ReplayDetected => "replay_detected",
            RevocationReason::UserSignOut => "user_sign_out",
            RevocationReason::IssuanceAborted => "issuance_aborted",
        }
    }
}

impl std::str::FromStr for RevocationReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logout" => Ok(RevocationReason::Logout),
            "replay_detected" => Ok(RevocationReason::ReplayDetected),
            "user_sign_out" => Ok(RevocationReason::UserSignOut),
            "issuance_aborted" => Ok(RevocationReason::IssuanceAborted),
            other => Err(format!("Unknown revocation reason: {}", other)),
        }
    }
}

/// Lifecycle state of a refresh record
///
/// `Live → Consumed` on rotation, `Live → Revoked` on logout or replay,
/// `Consumed → Revoked` on detected reuse. `Revoked` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RefreshStatus {
    Live,
    Consumed {
        at: DateTime<Utc>,
        successor_id: Uuid,
    },
    Revoked {
        at: DateTime<Utc>,
        reason: RevocationReason,
    },
}

impl RefreshStatus {
    /// Column value used by persistent stores
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshStatus::Live => "live",
            RefreshStatus::Consumed { .. } => "consumed",
            RefreshStatus::Revoked { .. } => "revoked",
        }
    }
}

/// Refresh record owned by the refresh store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRecord {
    /// Unique identifier for the record
    pub id: Uuid,

    /// User this record belongs to
    pub user_id: Uuid,

    /// Rotation family shared by every record descended from one login
    pub family_id: Uuid,

    /// SHA-256 hex digest of the opaque secret
    pub secret_hash: String,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    pub status: RefreshStatus,

    /// Record this one was rotated from, `None` for the login record
    pub parent_id: Option<Uuid>,
}

impl RefreshRecord {
    /// Creates the first, live record of a new family
    pub fn new_family(
        user_id: Uuid,
        secret_hash: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            family_id: Uuid::new_v4(),
            secret_hash,
            issued_at: now,
            expires_at: now + ttl,
            status: RefreshStatus::Live,
            parent_id: None,
        }
    }

    /// Creates the live successor of `self` in the same family
    pub fn successor(&self, secret_hash: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            family_id: self.family_id,
            secret_hash,
            issued_at: now,
            expires_at: now + ttl,
            status: RefreshStatus::Live,
            parent_id: Some(self.id),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.status, RefreshStatus::Live)
    }

    pub fn is_consumed(&self) -> bool {
        matches!(self.status, RefreshStatus::Consumed { .. })
    }

    pub fn is_revoked(&self) -> bool {
        matches!(self.status, RefreshStatus::Revoked { .. })
    }

    pub fn revocation_reason(&self) -> Option<RevocationReason> {
        match self.status {
            RefreshStatus::Revoked { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// `true` once `now` has reached the expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Marks a live record consumed. Returns `false` if it was not live.
    pub fn consume(&mut self, now: DateTime<Utc>, successor_id: Uuid) -> bool {
        if !self.is_live() {
            return false;
        }
        self.status = RefreshStatus::Consumed {
            at: now,
            successor_id,
        };
        true
    }

    /// Revokes the record. Returns `false` if it was already revoked.
    pub fn revoke(&mut self, now: DateTime<Utc>, reason: RevocationReason) -> bool {
        if self.is_revoked() {
            return false;
        }
        self.status = RefreshStatus::Revoked { at: now, reason };
        true
    }
}

fn timestamp_to_datetime(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_access_token_claims() {
        let user_id = Uuid::new_v4();
        let claims =
            Claims::new_access_token(user_id, t(0), Duration::seconds(300), JWT_ISSUER, JWT_AUDIENCE);

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.exp - claims.iat, 300);
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(claims.iss, JWT_ISSUER);
        assert_eq!(claims.aud, JWT_AUDIENCE);
        assert!(!claims.is_expired_at(t(299)));
        assert!(claims.is_expired_at(t(300)));
        assert_eq!(claims.expires_at(), t(300));
    }

    #[test]
    fn test_claims_nonce_is_unique() {
        let user_id = Uuid::new_v4();
        let a = Claims::new_access_token(user_id, t(0), Duration::seconds(60), "i", "a");
        let b = Claims::new_access_token(user_id, t(0), Duration::seconds(60), "i", "a");
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_successor_stays_in_family() {
        let root = RefreshRecord::new_family(Uuid::new_v4(), "h1".into(), t(0), Duration::days(1));
        let child = root.successor("h2".into(), t(100), Duration::days(1));

        assert_eq!(child.family_id, root.family_id);
        assert_eq!(child.user_id, root.user_id);
        assert_eq!(child.parent_id, Some(root.id));
        assert_eq!(child.expires_at, t(100) + Duration::days(1));
        assert!(child.is_live());
    }

    #[test]
    fn test_consume_is_compare_and_set() {
        let mut record =
            RefreshRecord::new_family(Uuid::new_v4(), "h".into(), t(0), Duration::days(1));
        let next = Uuid::new_v4();

        assert!(record.consume(t(10), next));
        assert!(record.is_consumed());
        assert!(!record.consume(t(11), Uuid::new_v4()));
        assert_eq!(
            record.status,
            RefreshStatus::Consumed {
                at: t(10),
                successor_id: next
            }
        );
    }

    #[test]
    fn test_revoke_is_terminal() {
        let mut record =
            RefreshRecord::new_family(Uuid::new_v4(), "h".into(), t(0), Duration::days(1));
        assert!(record.revoke(t(5), RevocationReason::Logout));
        assert!(!record.revoke(t(6), RevocationReason::ReplayDetected));
        assert!(!record.consume(t(7), Uuid::new_v4()));
        assert_eq!(record.revocation_reason(), Some(RevocationReason::Logout));
        assert_eq!(
            record.status,
            RefreshStatus::Revoked {
                at: t(5),
                reason: RevocationReason::Logout
            }
        );
    }

    #[test]
    fn test_record_expiry_boundary() {
        let record = RefreshRecord::new_family(Uuid::new_v4(), "h".into(), t(0), Duration::seconds(60));
        assert!(!record.is_expired_at(t(59)));
        assert!(record.is_expired_at(t(60)));
    }

    #[test]
    fn test_status_serialization_is_tagged() {
        let status = RefreshStatus::Revoked {
            at: t(0),
            reason: RevocationReason::ReplayDetected,
        };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["state"], "revoked");
        assert_eq!(json["reason"], "replay_detected");
        assert_eq!(status.as_str(), "revoked");
    }

    #[test]
    fn test_revocation_reason_round_trips_through_column_value() {
        for reason in [
            RevocationReason::Logout,
            RevocationReason::ReplayDetected,
            RevocationReason::UserSignOut,
            RevocationReason::IssuanceAborted,
        ] {
            assert_eq!(reason.as_str().parse::<RevocationReason>().unwrap(), reason);
        }
        assert!("bogus".parse::<RevocationReason>().is_err());
    }

    #[test]
    fn test_access_credential_expires_in() {
        let credential = AccessCredential {
            token: "jwt".into(),
            user_id: Uuid::new_v4(),
            issued_at: t(0),
            expires_at: t(300),
        };
        assert_eq!(credential.expires_in(t(100)), 200);
        assert_eq!(credential.expires_in(t(400)), 0);
    }
}
