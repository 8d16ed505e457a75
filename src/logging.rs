//! Logging setup for the `trace-dbg` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left to the binary.
//!
//! - `RUST_LOG`: filter directives, e.g. `RUST_LOG=trace_dbg=debug`. Defaults to `warn` so
//!   diagnostics do not drown the prompt.
//! - `TRACE_DBG_LOG_FORMAT`: `pretty` (default) or `json`.
//!
//! Logs go to stderr; stdout is reserved for command output.

use std::env;
use std::io;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "TRACE_DBG_LOG_FORMAT";

/// Log output format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unknown log format {0:?}, use 'pretty' or 'json'")]
    InvalidFormat(String),

    #[error("failed to install the log subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Installs the global subscriber, configured from the environment.
pub fn init_logging() -> Result<(), LoggingError> {
    let format = match env::var(LOG_FORMAT_ENV) {
        Ok(value) => value.parse()?,
        Err(_) => LogFormat::default(),
    };

    init_logging_with(format, LevelFilter::WARN)
}

/// Installs the global subscriber with an explicit format. `RUST_LOG` still overrides
/// `default_level`.
pub fn init_logging_with(format: LogFormat, default_level: LevelFilter) -> Result<(), LoggingError> {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let layer = match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    Registry::default().with(layer).try_init()?;

    Ok(())
}
