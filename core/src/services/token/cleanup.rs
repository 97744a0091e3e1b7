//! Token cleanup service for periodic maintenance of refresh records
//!
//! Purging is hygiene only: expired records are already unusable, removing
//! them just keeps the store small.

use std::sync::Arc;
use tracing::{error, info, warn};
use wl_shared::config::CleanupConfig;

use crate::errors::StoreError;
use crate::repositories::RefreshStore;
use crate::services::clock::Clock;

/// Service for deleting expired refresh records
pub struct TokenCleanupService<S: RefreshStore + 'static, C: Clock + 'static> {
    store: Arc<S>,
    clock: C,
    config: CleanupConfig,
}

impl<S: RefreshStore, C: Clock> TokenCleanupService<S, C> {
    pub fn new(store: Arc<S>, clock: C, config: CleanupConfig) -> Self {
        Self { store, clock, config }
    }

    /// Run a single cleanup cycle
    ///
    /// # Returns
    /// * `Ok(CleanupResult)` - Summary of the cycle, empty when disabled
    /// * `Err(StoreError)` - If the store could not be purged
    pub async fn run_cleanup(&self) -> Result<CleanupResult, StoreError> {
        if !self.config.enabled {
            return Ok(CleanupResult::default());
        }

        let now = self.clock.now();
        info!("Starting token cleanup cycle");

        let expired_records_deleted = self.store.purge_expired(now).await?;

        info!(expired_records_deleted, "Token cleanup completed");
        Ok(CleanupResult {
            expired_records_deleted,
        })
    }

    /// Start the cleanup service as a background task
    ///
    /// Spawns a tokio task that runs cleanup at regular intervals. A failed
    /// cycle is logged and the loop carries on.
    pub fn start_background_task(self: Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Token cleanup service is disabled");
            return None;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds.max(1));

        Some(tokio::spawn(async move {
            info!(
                "Token cleanup service started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                if let Err(e) = self.run_cleanup().await {
                    error!("Token cleanup cycle failed: {}", e);
                }
            }
        }))
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupResult {
    /// Number of expired refresh records deleted
    pub expired_records_deleted: usize,
}

impl CleanupResult {
    /// Get total number of items cleaned up
    pub fn total_cleaned(&self) -> usize {
        self.expired_records_deleted
    }
}
