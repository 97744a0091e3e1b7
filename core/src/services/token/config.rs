//! Configuration for the token services

use chrono::Duration;
use wl_shared::config::JwtConfig;

use crate::domain::entities::token::{
    ACCESS_TOKEN_EXPIRY_SECS, JWT_AUDIENCE, JWT_ISSUER, REFRESH_TOKEN_EXPIRY_SECS,
};

/// Lifetimes and claim values used by the signer and refresh store
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// Access credential lifetime
    pub access_ttl: Duration,
    /// Refresh secret lifetime, renewed on each rotation
    pub refresh_ttl: Duration,
    /// `iss` claim written and required
    pub issuer: String,
    /// `aud` claim written and required
    pub audience: String,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            access_ttl: Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS),
            refresh_ttl: Duration::seconds(REFRESH_TOKEN_EXPIRY_SECS),
            issuer: JWT_ISSUER.to_string(),
            audience: JWT_AUDIENCE.to_string(),
        }
    }
}

impl TokenServiceConfig {
    /// Reads lifetimes and claim values from the loaded JWT configuration
    pub fn from_jwt_config(config: &JwtConfig) -> Self {
        Self {
            access_ttl: Duration::seconds(config.access_token_expiry),
            refresh_ttl: Duration::seconds(config.refresh_token_expiry),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }
}
