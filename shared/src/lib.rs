//! Shared utilities and common types for the Wearly server
//!
//! This crate provides functionality used across all server modules:
//! - Configuration types (environment, database, auth)
//! - Error response structures
//! - Tracing initialisation

pub mod config;
pub mod errors;
pub mod telemetry;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, CleanupConfig, DatabaseConfig, Environment, JwtConfig, LogFormat,
    LoggingConfig, VerificationKeyConfig,
};
pub use errors::{error_codes, ConfigError, ErrorResponse, IntoErrorResponse};
pub use telemetry::init_tracing;
