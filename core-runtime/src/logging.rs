//! # Logging Bootstrap
//!
//! Configures the `tracing-subscriber` infrastructure for hosts embedding the
//! extraction core. Supports pretty-printed output for development and JSON
//! for structured collection, with standard `RUST_LOG`-style filtering.
//!
//! ## Usage
//!
//! ```no_run
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Pretty)
//!     .with_filter("info,core_extraction=debug");
//! init_logging(config).expect("failed to initialize logging");
//!
//! tracing::info!("extractor ready");
//! ```

use crate::error::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for development.
    Pretty,
    /// Newline-delimited JSON for log collection.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive string, e.g. `"info,core_extraction=debug"`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

/// Install the global tracing subscriber.
///
/// Fails if the filter directive does not parse or a subscriber is already
/// installed for this process.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| Error::Config(format!("invalid log filter '{}': {}", config.filter, e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.format {
        LogFormat::Pretty => builder
            .try_init()
            .map_err(|e| Error::Internal(format!("failed to install subscriber: {}", e))),
        LogFormat::Json => builder
            .json()
            .try_init()
            .map_err(|e| Error::Internal(format!("failed to install subscriber: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_pretty_info() {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.filter, "info");
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let config = LoggingConfig::default().with_filter("core_extraction=notalevel");
        assert!(matches!(init_logging(config), Err(Error::Config(_))));
    }
}
