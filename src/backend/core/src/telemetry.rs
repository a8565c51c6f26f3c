//! Structured logging setup.
//!
//! JSON output for production, pretty output for development, compact for
//! test environments. The level can always be overridden with `RUST_LOG`.

use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{PalisadeError, Result};

/// Initialize the global tracing subscriber from configuration.
///
/// Returns an error if a subscriber is already installed or the level
/// directive cannot be parsed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            PalisadeError::configuration(format!("invalid log level '{}': {}", config.level, e))
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::NONE)
        .with_target(true);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    installed.map_err(|e| {
        PalisadeError::configuration(format!("failed to install tracing subscriber: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            level: "definitely-not-a-level=".to_string(),
            format: LogFormat::Compact,
        };

        // Must not panic; either the filter parse fails or a subscriber from
        // another test is already installed.
        let _ = init_logging(&config);
    }
}
