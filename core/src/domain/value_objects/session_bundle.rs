//! Session bundle returned after login or refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::user::UserIdentity;
use crate::services::token::IssuedTokens;

/// Access credential, new refresh secret and user snapshot for the caller
///
/// Constructed per call and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionBundle {
    /// JWT access token for API authentication
    pub access_token: String,

    /// Always "Bearer"
    pub token_type: String,

    /// Access token expiry instant
    pub access_expires_at: DateTime<Utc>,

    /// Access token lifetime in seconds at issue time
    pub expires_in: i64,

    /// New opaque refresh secret; the previous one is no longer usable
    pub refresh_token: String,

    /// Refresh secret expiry instant
    pub refresh_expires_at: DateTime<Utc>,

    /// Profile snapshot for the presentation layer
    pub user: UserIdentity,
}

impl SessionBundle {
    /// Builds a bundle from freshly issued tokens
    pub fn from_issued(issued: IssuedTokens, user: UserIdentity, now: DateTime<Utc>) -> Self {
        Self {
            expires_in: issued.access.expires_in(now),
            access_expires_at: issued.access.expires_at,
            access_token: issued.access.token,
            token_type: "Bearer".to_string(),
            refresh_expires_at: issued.refresh_expires_at,
            refresh_token: issued.refresh_secret.into_inner(),
            user,
        }
    }
}
