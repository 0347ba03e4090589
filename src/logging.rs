//! Logging System
//!
//! Structured logging with `tracing`. Library code only emits events; the
//! binary installs a subscriber that writes them to stderr as text or JSON.

use crate::error::RustyMergeError;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

/// Environment variable holding a filter directive that overrides the configured level
pub const LOG_ENV: &str = "RUSTY_MERGE_LOG";

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = RustyMergeError;

    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(RustyMergeError::ConfigError(format!(
                "Invalid log format: {format} (must be 'json' or 'text')"
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level or filter directive: trace, debug, info, warn, error, off
    pub level: String,

    /// Output format
    pub format: LogFormat,

    /// Colored output (text format only)
    pub color: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
            color: true,
        }
    }
}

/// Installs the global subscriber.
///
/// `RUSTY_MERGE_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), RustyMergeError> {
    let filter = build_env_filter(config)?;
    let subscriber = Registry::default().with(filter);
    let result = match config.format {
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.color)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.map_err(|error| RustyMergeError::ConfigError(error.to_string()))
}

/// Build the filter from `RUSTY_MERGE_LOG` or the configured level
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, RustyMergeError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|error| RustyMergeError::ConfigError(format!("Invalid log level '{}': {}", config.level, error)))
}
