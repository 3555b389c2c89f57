//! Proxy configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Severity at which [`crate::TracingSink`] emits trace events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    /// `TRACE`
    Trace,
    /// `DEBUG`
    Debug,
    /// `INFO` - default
    #[default]
    Info,
    /// `WARN`
    Warn,
    /// `ERROR`
    Error,
}

impl From<TraceLevel> for tracing::Level {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Trace => tracing::Level::TRACE,
            TraceLevel::Debug => tracing::Level::DEBUG,
            TraceLevel::Info => tracing::Level::INFO,
            TraceLevel::Warn => tracing::Level::WARN,
            TraceLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Behavior of the interception hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// Level of emitted trace events
    pub trace_level: TraceLevel,
    /// Record call arguments in trace events
    pub include_arguments: bool,
    /// Emit the exiting event when the target fails
    pub trace_exit_on_failure: bool,
}

impl ProxyConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With trace level
    #[inline]
    #[must_use]
    pub fn with_trace_level(mut self, level: TraceLevel) -> Self {
        self.trace_level = level;
        self
    }

    /// With argument recording
    #[inline]
    #[must_use]
    pub fn with_arguments(mut self, include: bool) -> Self {
        self.include_arguments = include;
        self
    }

    /// With exiting event on failure
    #[inline]
    #[must_use]
    pub fn with_exit_on_failure(mut self, enabled: bool) -> Self {
        self.trace_exit_on_failure = enabled;
        self
    }

    /// Parse TOML
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed input or unknown keys.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            trace_level: TraceLevel::Info,
            include_arguments: false,
            trace_exit_on_failure: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProxyConfig::new();
        assert_eq!(config.trace_level, TraceLevel::Info);
        assert!(!config.include_arguments);
        assert!(config.trace_exit_on_failure);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ProxyConfig::from_toml_str("trace_level = \"debug\"").unwrap();
        assert_eq!(config.trace_level, TraceLevel::Debug);
        assert!(config.trace_exit_on_failure);
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = ProxyConfig::from_toml_str("retries = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy.toml");
        std::fs::write(&path, "include_arguments = true\ntrace_exit_on_failure = false\n").unwrap();

        let config = ProxyConfig::load(&path).unwrap();
        assert!(config.include_arguments);
        assert!(!config.trace_exit_on_failure);
    }

    #[test]
    fn load_missing_file() {
        let err = ProxyConfig::load("/nonexistent/proxy.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn level_maps_to_tracing() {
        assert_eq!(tracing::Level::from(TraceLevel::Warn), tracing::Level::WARN);
    }
}
