//! Issuance of access credential and refresh secret pairs

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::entities::token::{AccessCredential, RevocationReason};
use crate::domain::value_objects::RefreshSecret;
use crate::errors::IssueError;
use crate::repositories::token::RefreshStore;

use super::signer::Signer;

/// A freshly issued pair
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access: AccessCredential,
    pub refresh_secret: RefreshSecret,
    pub refresh_expires_at: DateTime<Utc>,
    pub family_id: Uuid,
    pub user_id: Uuid,
}

/// Creates token pairs at login and on rotation
pub struct TokenIssuer<S: RefreshStore> {
    signer: Arc<Signer>,
    store: Arc<S>,
}

impl<S: RefreshStore> TokenIssuer<S> {
    pub fn new(signer: Arc<Signer>, store: Arc<S>) -> Self {
        Self { signer, store }
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Issues the first pair of a new family
    ///
    /// The credential is signed before the family is created, so a signing
    /// failure leaves nothing behind.
    pub async fn login(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<IssuedTokens, IssueError> {
        let access = self.signer.issue(user_id, now)?;
        let refresh = self.store.create_family(user_id, now).await?;

        debug!(family_id = %refresh.record.family_id, user_id = %user_id, "Issued login token pair");
        Ok(IssuedTokens {
            access,
            refresh_expires_at: refresh.record.expires_at,
            family_id: refresh.record.family_id,
            user_id,
            refresh_secret: refresh.secret,
        })
    }

    /// Rotates `secret` and issues a new pair for the family's user
    ///
    /// If signing fails after the rotation committed, the family is revoked
    /// so no live record is left that nobody holds the secret for.
    pub async fn refresh(&self, secret: &RefreshSecret, now: DateTime<Utc>) -> Result<IssuedTokens, IssueError> {
        let refresh = self.store.rotate(secret, now).await?;
        let user_id = refresh.record.user_id;
        let family_id = refresh.record.family_id;

        let access = match self.signer.issue(user_id, now) {
            Ok(access) => access,
            Err(e) => {
                error!(family_id = %family_id, user_id = %user_id, error = %e, "Signing failed after rotation, revoking family");
                if let Err(revoke_err) = self
                    .store
                    .revoke_family(family_id, RevocationReason::IssuanceAborted, now)
                    .await
                {
                    error!(family_id = %family_id, error = %revoke_err, "Failed to revoke family after aborted issuance");
                }
                return Err(e.into());
            }
        };

        Ok(IssuedTokens {
            access,
            refresh_expires_at: refresh.record.expires_at,
            family_id,
            user_id,
            refresh_secret: refresh.secret,
        })
    }
}
