//! Session orchestration

use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::entities::token::{RevocationReason, TokenValidationMeta};
use crate::domain::value_objects::{RefreshSecret, SessionBundle};
use crate::errors::{DirectoryError, IssueError, RefreshError, SessionError};
use crate::repositories::{RefreshStore, UserDirectory};
use crate::services::clock::Clock;
use crate::services::token::{Signer, TokenIssuer};

/// Session lifecycle following successful authentication
///
/// Only `SessionError` leaves this type; lower-level error kinds are mapped
/// and logged here.
pub struct SessionService<S, D, C>
where
    S: RefreshStore,
    D: UserDirectory,
    C: Clock,
{
    /// Token pair issuance over the refresh store
    issuer: TokenIssuer<S>,
    /// Read-only view of users
    directory: Arc<D>,
    /// Time source for every operation
    clock: C,
}

impl<S, D, C> SessionService<S, D, C>
where
    S: RefreshStore,
    D: UserDirectory,
    C: Clock,
{
    /// Create a new session service
    ///
    /// # Arguments
    ///
    /// * `signer` - Access credential signer with its key set
    /// * `store` - Refresh record store
    /// * `directory` - User lookup
    /// * `clock` - Time source
    pub fn new(signer: Arc<Signer>, store: Arc<S>, directory: Arc<D>, clock: C) -> Self {
        Self {
            issuer: TokenIssuer::new(signer, store),
            directory,
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &Arc<S> {
        self.issuer.store()
    }

    /// Starts a session for an already authenticated user
    ///
    /// The user is resolved first, so unknown users never get a family.
    ///
    /// # Errors
    ///
    /// * `UnknownUser` - The directory has no such user
    /// * `Unavailable` - Directory, store or signing failure
    pub async fn authenticate(&self, user_id: Uuid) -> Result<SessionBundle, SessionError> {
        let user = self
            .directory
            .lookup_user(user_id)
            .await
            .map_err(|e| log_directory_error(user_id, e))?;

        let now = self.clock.now();
        let issued = self
            .issuer
            .login(user_id, now)
            .await
            .map_err(log_issue_error)?;

        info!(user_id = %user_id, family_id = %issued.family_id, "Session started");
        Ok(SessionBundle::from_issued(issued, user, now))
    }

    /// Exchanges a refresh secret for a new bundle, rotating the secret
    ///
    /// # Errors
    ///
    /// * `SessionExpired` - The secret expired
    /// * `SessionInvalid` - Unknown or revoked secret, or the owning user no longer exists
    /// * `SessionCompromised` - The secret was already used; its family is now revoked
    /// * `Unavailable` - Storage or directory failure
    pub async fn refresh_session(&self, secret: &RefreshSecret) -> Result<SessionBundle, SessionError> {
        let now = self.clock.now();
        let issued = self
            .issuer
            .refresh(secret, now)
            .await
            .map_err(log_issue_error)?;

        let user = match self.directory.lookup_user(issued.user_id).await {
            Ok(user) => user,
            Err(e) => {
                // The rotated secret is never handed out, so the family goes too
                if let Err(revoke_err) = self
                    .store()
                    .revoke_family(issued.family_id, RevocationReason::IssuanceAborted, now)
                    .await
                {
                    error!(family_id = %issued.family_id, error = %revoke_err, "Failed to revoke family after user lookup failure");
                }
                return Err(match log_directory_error(issued.user_id, e) {
                    SessionError::UnknownUser => SessionError::SessionInvalid,
                    other => other,
                });
            }
        };

        debug!(user_id = %issued.user_id, family_id = %issued.family_id, "Session refreshed");
        Ok(SessionBundle::from_issued(issued, user, now))
    }

    /// Ends the session owning `secret`
    ///
    /// Always succeeds: unknown or already revoked secrets are a no-op and
    /// storage failures are logged rather than surfaced.
    pub async fn end_session(&self, secret: &RefreshSecret) {
        let now = self.clock.now();
        match self
            .store()
            .revoke_family_containing(secret, RevocationReason::Logout, now)
            .await
        {
            Ok(Some(family_id)) => info!(family_id = %family_id, "Session ended"),
            Ok(None) => debug!("Logout with unknown refresh secret ignored"),
            Err(e) => error!(error = %e, "Failed to revoke session family on logout"),
        }
    }

    /// Ends every session of a user
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of sessions that were still live
    pub async fn end_all_sessions(&self, user_id: Uuid) -> Result<usize, SessionError> {
        let now = self.clock.now();
        let ended = self
            .store()
            .revoke_all_for_user(user_id, now)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, error = %e, "Failed to end all sessions");
                SessionError::Unavailable
            })?;

        info!(user_id = %user_id, ended, "All sessions ended");
        Ok(ended)
    }

    /// Verifies an access credential
    ///
    /// Every failure collapses to `Unauthenticated`; the precise reason is
    /// only logged.
    pub fn authorize(&self, access_token: &str) -> Result<TokenValidationMeta, SessionError> {
        self.issuer
            .signer()
            .verify(access_token, self.clock.now())
            .map_err(|e| {
                debug!(reason = %e, "Access credential rejected");
                SessionError::Unauthenticated
            })
    }

    /// Deletes expired refresh records
    pub async fn purge_expired(&self) -> Result<usize, SessionError> {
        self.store()
            .purge_expired(self.clock.now())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to purge expired refresh records");
                SessionError::Unavailable
            })
    }
}

fn log_issue_error(err: IssueError) -> SessionError {
    match &err {
        IssueError::Refresh(RefreshError::Store(e)) => {
            error!(error = %e, "Refresh store failure during issuance")
        }
        IssueError::Refresh(RefreshError::AlreadyConsumed) => {}
        IssueError::Refresh(e) => debug!(reason = %e, "Refresh rejected"),
        IssueError::Token(e) => error!(error = %e, "Access credential signing failed"),
    }
    err.into()
}

fn log_directory_error(user_id: Uuid, err: DirectoryError) -> SessionError {
    match &err {
        DirectoryError::NotFound => debug!(user_id = %user_id, "User not found in directory"),
        DirectoryError::Unavailable { .. } => {
            error!(user_id = %user_id, error = %err, "User directory unavailable")
        }
    }
    err.into()
}
