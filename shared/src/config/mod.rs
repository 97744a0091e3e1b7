//! Configuration module
//!
//! - `auth` - signing keys, token lifetimes, refresh record cleanup
//! - `database` - MySQL connection pool configuration
//! - `environment` - environment detection and logging configuration
//!
//! Configuration is loaded once at process start and handed to the services
//! that need it; nothing here is mutated afterwards.

pub mod auth;
pub mod database;
pub mod environment;

use ::config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub use auth::{AuthConfig, CleanupConfig, JwtConfig, VerificationKeyConfig};
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig::new("mysql://localhost:3306/wearly_dev"),
            auth: AuthConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Development),
        }
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        Self {
            environment,
            database: DatabaseConfig::from_env(),
            auth: AuthConfig::from_env(),
            logging: LoggingConfig::from_env(environment),
        }
    }

    /// Load configuration in layers: `.env` files, environment variables,
    /// the optional per-environment config file, then `WEARLY__`-prefixed
    /// overrides (e.g. `WEARLY__AUTH__JWT__ACCESS_TOKEN_EXPIRY=300`).
    pub fn load() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();
        dotenvy::from_filename(environment.env_file()).ok();
        dotenvy::dotenv().ok();

        let defaults = Self::from_env();
        let settings = Config::builder()
            .add_source(Config::try_from(&defaults)?)
            .add_source(File::with_name(&environment.config_file()).required(false))
            .add_source(
                ::config::Environment::with_prefix("WEARLY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a working session core
    pub fn validate(&self) -> Result<(), ConfigError> {
        let jwt = &self.auth.jwt;
        if jwt.access_token_expiry <= 0 {
            return Err(ConfigError::Invalid {
                message: "access token expiry must be positive".to_string(),
            });
        }
        if jwt.refresh_token_expiry <= jwt.access_token_expiry {
            return Err(ConfigError::Invalid {
                message: "refresh token expiry must exceed access token expiry".to_string(),
            });
        }
        if self.environment.is_production() && jwt.is_using_default_secret() {
            return Err(ConfigError::Invalid {
                message: "default JWT secret is not allowed in production".to_string(),
            });
        }
        Ok(())
    }
}
