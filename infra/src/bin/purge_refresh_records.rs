//! One-shot purge of expired refresh records
//!
//! Intended for cron-style scheduling where the in-process cleanup task is
//! disabled (`TOKEN_CLEANUP_ENABLED=false`).

use anyhow::Context;
use wl_shared::config::AppConfig;
use wl_shared::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    tracing::info!(environment = %config.environment, "Starting refresh record purge");

    let core = wl_infra::build_session_core(&config)
        .await
        .context("failed to build session core")?;

    let purged = core
        .service
        .purge_expired()
        .await
        .context("failed to purge expired refresh records")?;

    tracing::info!(purged, "Refresh record purge finished");
    core.pool.close().await;
    Ok(())
}
