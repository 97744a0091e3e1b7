//! Assembly of the production session core

use std::sync::Arc;
use wl_core::errors::DomainError;
use wl_core::services::{
    SessionService, Signer, SigningKeys, SystemClock, TokenCleanupService, TokenServiceConfig,
};
use wl_shared::config::AppConfig;

use crate::database::{DatabasePool, MySqlRefreshStore, MySqlUserDirectory};
use crate::InfrastructureError;

/// Session service over MySQL storage and the system clock
pub type MySqlSessionService = SessionService<MySqlRefreshStore, MySqlUserDirectory, SystemClock>;

/// Everything a server needs to serve sessions
pub struct SessionCore {
    pub service: Arc<MySqlSessionService>,
    pub cleanup: Arc<TokenCleanupService<MySqlRefreshStore, SystemClock>>,
    pub pool: DatabasePool,
}

/// Builds the session core described by `config`
///
/// Validates the configuration, loads signing keys, connects the pool and
/// applies migrations. The cleanup task is returned unstarted.
pub async fn build_session_core(config: &AppConfig) -> Result<SessionCore, InfrastructureError> {
    config.validate()?;

    let jwt = &config.auth.jwt;
    if jwt.is_using_default_secret() {
        tracing::warn!("Using the default JWT secret; set JWT_SECRET outside development");
    }

    let keys = SigningKeys::from_jwt_config(jwt).map_err(DomainError::from)?;
    let token_config = TokenServiceConfig::from_jwt_config(jwt);
    tracing::info!(
        kid = keys.active_kid(),
        algorithm = ?keys.algorithm(),
        access_ttl_secs = token_config.access_ttl.num_seconds(),
        refresh_ttl_secs = token_config.refresh_ttl.num_seconds(),
        "Loaded signing keys"
    );

    let pool = DatabasePool::new(config.database.clone()).await?;
    pool.run_migrations().await?;

    let store = Arc::new(MySqlRefreshStore::new(
        pool.get_pool().clone(),
        token_config.refresh_ttl,
    ));
    let directory = Arc::new(MySqlUserDirectory::new(pool.get_pool().clone()));
    let signer = Arc::new(Signer::new(keys, &token_config));

    let service = Arc::new(SessionService::new(
        signer,
        Arc::clone(&store),
        directory,
        SystemClock,
    ));
    let cleanup = Arc::new(TokenCleanupService::new(
        store,
        SystemClock,
        config.auth.cleanup.clone(),
    ));

    Ok(SessionCore {
        service,
        cleanup,
        pool,
    })
}
