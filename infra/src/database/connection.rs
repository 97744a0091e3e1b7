//! MySQL pool for the session stores
//!
//! Pool acquisition timeouts surface from the stores as
//! `StoreError::Unavailable`, so `connect_timeout` bounds how long a login or
//! refresh can wait on the database.

use log::LevelFilter;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{ConnectOptions, MySqlPool};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use wl_shared::config::DatabaseConfig;

use crate::InfrastructureError;

/// Shared handle to the MySQL pool and the settings it was built from
#[derive(Clone)]
pub struct DatabasePool {
    pool: MySqlPool,
    config: DatabaseConfig,
}

impl DatabasePool {
    /// Connects eagerly, keeping one connection open
    ///
    /// ```no_run
    /// use wl_shared::config::DatabaseConfig;
    /// use wl_infra::database::DatabasePool;
    ///
    /// async fn connect() -> Result<DatabasePool, wl_infra::InfrastructureError> {
    ///     DatabasePool::new(DatabaseConfig::new("mysql://auth:pw@localhost/wearly")).await
    /// }
    /// ```
    pub async fn new(config: DatabaseConfig) -> Result<Self, InfrastructureError> {
        tracing::info!(
            url = %config.redacted_url(),
            max_connections = config.max_connections,
            "Connecting to MySQL"
        );

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .max_lifetime(Duration::from_secs(config.max_lifetime))
            .test_before_acquire(true)
            .connect_with(Self::connect_options(&config)?)
            .await
            .map_err(|e| {
                tracing::error!(url = %config.redacted_url(), error = %e, "MySQL connection failed");
                InfrastructureError::Database(e)
            })?;

        Ok(Self { pool, config })
    }

    /// Parses the URL; statements log at debug, slow ones at warn
    pub fn connect_options(config: &DatabaseConfig) -> Result<MySqlConnectOptions, InfrastructureError> {
        let options = MySqlConnectOptions::from_str(&config.url).map_err(|e| {
            InfrastructureError::Config(format!("Invalid database URL {}: {}", config.redacted_url(), e))
        })?;

        Ok(options.log_statements(LevelFilter::Debug).log_slow_statements(
            LevelFilter::Warn,
            Duration::from_millis(config.slow_query_threshold),
        ))
    }

    pub fn get_pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Round-trips `SELECT 1`
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let value: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Database health check failed");
                InfrastructureError::Database(e)
            })?;

        Ok(value == 1)
    }

    pub fn get_statistics(&self) -> PoolStatistics {
        PoolStatistics {
            connections: self.pool.size(),
            idle_connections: self.pool.num_idle(),
            max_connections: self.config.max_connections,
        }
    }

    /// Waits for checked-out connections to be returned, then closes them
    pub async fn close(&self) {
        tracing::info!(stats = %self.get_statistics(), "Closing MySQL pool");
        self.pool.close().await;
    }

    /// Applies `infra/migrations`, creating `refresh_records` on first run
    pub async fn run_migrations(&self) -> Result<(), InfrastructureError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| InfrastructureError::Migration(e.to_string()))?;

        tracing::info!("Refresh record schema is up to date");
        Ok(())
    }
}

/// Point-in-time pool usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatistics {
    pub connections: u32,
    pub idle_connections: usize,
    pub max_connections: u32,
}

impl fmt::Display for PoolStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} connections ({} idle)",
            self.connections, self.max_connections, self.idle_connections
        )
    }
}
