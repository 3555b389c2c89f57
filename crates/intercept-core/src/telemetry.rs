//! Subscriber setup for binaries
//!
//! Trace events from [`crate::TracingSink`] are plain `tracing` events; a
//! process decides where they go by installing a subscriber. This module
//! installs the standard one: stderr, `RUST_LOG` filtering, text or JSON.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Failures while installing the subscriber
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The fallback directive did not parse
    #[error("invalid log filter `{directive}`: {source}")]
    Filter {
        /// Directive that was rejected
        directive: String,
        /// Parser failure
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// Another global subscriber is already in place
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Build the filter: `RUST_LOG` if set and valid, otherwise `fallback`
///
/// # Errors
/// Returns [`TelemetryError::Filter`] if `fallback` is not a valid directive.
pub fn env_filter(fallback: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(fallback).map_err(|source| TelemetryError::Filter {
            directive: fallback.to_string(),
            source,
        }),
    }
}

/// Install a global `fmt` subscriber writing to stderr
///
/// # Errors
/// Returns [`TelemetryError`] if the filter is invalid or a subscriber is
/// already installed.
pub fn init_subscriber(format: LogFormat, fallback: &str) -> Result<(), TelemetryError> {
    let filter = env_filter(fallback)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|_| TelemetryError::AlreadyInstalled)
}
