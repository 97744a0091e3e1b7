//! Deployment environment and logging settings

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Variables consulted, in order, to detect the deployment environment
const ENVIRONMENT_VARS: [&str; 3] = ["ENVIRONMENT", "ENV", "RUST_ENV"];

/// Where the server is running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Detects the environment from the first set variable among
    /// `ENVIRONMENT`, `ENV` and `RUST_ENV`. Unset or unrecognised values
    /// fall back to development.
    pub fn from_env() -> Self {
        ENVIRONMENT_VARS
            .iter()
            .find_map(|name| env::var(name).ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Optional layered config file, without extension
    pub fn config_file(&self) -> String {
        format!("config/{}", self.as_str())
    }

    /// Per-environment dotenv file loaded before `.env`
    pub fn env_file(&self) -> String {
        format!(".env.{}", self.as_str())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "staging" | "stage" | "test" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("Invalid environment: {}", other)),
        }
    }
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("Invalid log format: {}", other)),
        }
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// ANSI colours, terminal output only
    #[serde(default)]
    pub colored: bool,

    /// Include file and line of each event
    #[serde(default)]
    pub source_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl LoggingConfig {
    /// Defaults per environment
    ///
    /// Development gets verbose, human readable output for the session
    /// crates. Deployed environments emit JSON at `info` with SQLx
    /// statement logging held back to warnings.
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self {
                level: String::from("info,wl_core=debug,wl_infra=debug,sqlx=info"),
                format: LogFormat::Pretty,
                colored: true,
                source_location: true,
            },
            Environment::Staging | Environment::Production => Self {
                level: String::from("info,sqlx=warn"),
                format: LogFormat::Json,
                colored: false,
                source_location: false,
            },
        }
    }

    /// Environment defaults overridden by `LOG_LEVEL` and `LOG_FORMAT`
    pub fn from_env(env: Environment) -> Self {
        let mut config = Self::for_environment(env);
        if let Ok(level) = env::var("LOG_LEVEL") {
            config.level = level;
        }
        if let Some(format) = env::var("LOG_FORMAT").ok().and_then(|f| f.parse().ok()) {
            config.format = format;
            config.colored = config.colored && format != LogFormat::Json;
        }
        config
    }
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}
