//! # Infrastructure Layer
//!
//! Concrete implementations behind the session core's repository traits,
//! and the wiring that assembles a production `SessionService`.
//!
//! - **Database**: MySQL connection pool, migrations, `MySqlRefreshStore`
//!   and `MySqlUserDirectory` using SQLx
//! - **Bootstrap**: builds the session service and cleanup task from an
//!   `AppConfig`
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)

// Re-export core error types for convenience
pub use wl_core::errors::*;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Session core assembly
#[cfg(feature = "mysql")]
pub mod bootstrap;

#[cfg(feature = "mysql")]
pub use bootstrap::{build_session_core, MySqlSessionService, SessionCore};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error raised by the session core
    #[error(transparent)]
    Domain(#[from] wl_core::errors::DomainError),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

impl From<wl_shared::errors::ConfigError> for InfrastructureError {
    fn from(err: wl_shared::errors::ConfigError) -> Self {
        InfrastructureError::Config(err.to_string())
    }
}
