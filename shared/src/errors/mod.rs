//! Shared error types and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Standard error response body handed to the transport layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for client identification
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,

    /// Timestamp when the error occurred
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    /// Add a detail field to the error response
    pub fn add_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let details = self.details.get_or_insert_with(HashMap::new);
        if let Ok(json_value) = serde_json::to_value(value) {
            details.insert(key.into(), json_value);
        }
        self
    }
}

/// Error codes surfaced by the session core
pub mod error_codes {
    pub const SESSION_EXPIRED: &str = "SESSION_EXPIRED";
    pub const SESSION_INVALID: &str = "SESSION_INVALID";
    pub const SESSION_COMPROMISED: &str = "SESSION_COMPROMISED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const UNKNOWN_USER: &str = "UNKNOWN_USER";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
}

/// Trait for converting errors to ErrorResponse
pub trait IntoErrorResponse {
    fn to_error_response(&self) -> ErrorResponse;
}
