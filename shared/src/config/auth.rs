//! Authentication session configuration

use serde::{Deserialize, Serialize};

const DEFAULT_SECRET: &str = "development-secret-please-change-in-production";

/// JWT access credential and refresh lifetime configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Shared secret for HS256 signing
    pub secret: String,

    /// Algorithm for JWT signing ("HS256" or "RS256")
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Key id placed in the `kid` header of issued credentials
    #[serde(default = "default_key_id")]
    pub key_id: String,

    /// PEM private key path (RS256 only)
    #[serde(default)]
    pub private_key_path: Option<String>,

    /// PEM public key path (RS256 only)
    #[serde(default)]
    pub public_key_path: Option<String>,

    /// Retired keys still accepted for verification
    #[serde(default)]
    pub previous_keys: Vec<VerificationKeyConfig>,

    /// Access token lifetime in seconds
    pub access_token_expiry: i64,

    /// Refresh token lifetime in seconds
    pub refresh_token_expiry: i64,

    /// JWT issuer claim
    pub issuer: String,

    /// JWT audience claim
    pub audience: String,
}

/// A verification-only key kept around so credentials signed before a key
/// rotation keep verifying until they expire.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct VerificationKeyConfig {
    /// Key id matched against the credential `kid` header
    pub key_id: String,

    /// Shared secret (HS256)
    #[serde(default)]
    pub secret: Option<String>,

    /// PEM public key path (RS256)
    #[serde(default)]
    pub public_key_path: Option<String>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            algorithm: default_algorithm(),
            key_id: default_key_id(),
            private_key_path: None,
            public_key_path: None,
            previous_keys: Vec::new(),
            access_token_expiry: 900,     // 15 minutes
            refresh_token_expiry: 604800, // 7 days
            issuer: String::from("wearly"),
            audience: String::from("wearly-api"),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Create from environment variables
    ///
    /// `JWT_PREVIOUS_SECRETS` holds retired HS256 keys as `kid=secret`
    /// pairs separated by commas.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let previous_keys = std::env::var("JWT_PREVIOUS_SECRETS")
            .map(|raw| parse_previous_secrets(&raw))
            .unwrap_or_default();

        Self {
            secret: std::env::var("JWT_SECRET").unwrap_or(defaults.secret),
            algorithm: std::env::var("JWT_ALGORITHM").unwrap_or(defaults.algorithm),
            key_id: std::env::var("JWT_KEY_ID").unwrap_or(defaults.key_id),
            private_key_path: std::env::var("JWT_PRIVATE_KEY_PATH").ok(),
            public_key_path: std::env::var("JWT_PUBLIC_KEY_PATH").ok(),
            previous_keys,
            access_token_expiry: std::env::var("JWT_ACCESS_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.access_token_expiry),
            refresh_token_expiry: std::env::var("JWT_REFRESH_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.refresh_token_expiry),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or(defaults.audience),
        }
    }

    /// Set access token expiry in seconds
    pub fn with_access_expiry_secs(mut self, secs: i64) -> Self {
        self.access_token_expiry = secs;
        self
    }

    /// Set refresh token expiry in seconds
    pub fn with_refresh_expiry_secs(mut self, secs: i64) -> Self {
        self.refresh_token_expiry = secs;
        self
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.algorithm.eq_ignore_ascii_case("HS256") && self.secret == DEFAULT_SECRET
    }
}

/// Expired refresh record housekeeping
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// Whether to run the periodic purge
    #[serde(default = "default_cleanup_enabled")]
    pub enabled: bool,

    /// How often to purge, in seconds
    #[serde(default = "default_cleanup_interval")]
    pub interval_seconds: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: default_cleanup_enabled(),
            interval_seconds: default_cleanup_interval(),
        }
    }
}

impl CleanupConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("TOKEN_CLEANUP_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enabled),
            interval_seconds: std::env::var("TOKEN_CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.interval_seconds),
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,

    /// Refresh record cleanup
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
            cleanup: CleanupConfig::from_env(),
        }
    }
}

fn parse_previous_secrets(raw: &str) -> Vec<VerificationKeyConfig> {
    raw.split(',')
        .filter_map(|pair| {
            let (kid, secret) = pair.trim().split_once('=')?;
            if kid.is_empty() || secret.is_empty() {
                return None;
            }
            Some(VerificationKeyConfig {
                key_id: kid.to_string(),
                secret: Some(secret.to_string()),
                public_key_path: None,
            })
        })
        .collect()
}

fn default_algorithm() -> String {
    String::from("HS256")
}

fn default_key_id() -> String {
    String::from("primary")
}

fn default_cleanup_enabled() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    3600
}
