//! Tracing subscriber setup

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Install the global tracing subscriber described by `config`.
///
/// `RUST_LOG` overrides `config.level` when present. Calling this twice is
/// harmless: the second installation attempt is ignored.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt()
        .with_env_filter(filter)
        .with_ansi(config.colored)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
