mod engine;
mod simulation;
mod snapshots;

pub use engine::*;
pub use simulation::*;
pub use snapshots::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub snapshots: SnapshotsConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults for missing keys.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                }
                Self::default()
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    pub(crate) fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        match self.engine.transport {
            EngineTransportKind::Process => {
                if self.engine.command.trim().is_empty() {
                    errors.push(ConfigError::error(
                        "engine.command",
                        "command must not be empty for the process transport",
                    ));
                }
            }
            EngineTransportKind::Socket => {
                if !(self.engine.url.starts_with("ws://") || self.engine.url.starts_with("wss://")) {
                    errors.push(ConfigError::error(
                        "engine.url",
                        "url must start with ws:// or wss://",
                    ));
                }
            }
        }

        if self.engine.startup_timeout_ms == 0 {
            errors.push(ConfigError::error(
                "engine.startup_timeout_ms",
                "startup timeout must be greater than 0",
            ));
        }

        if self.engine.reconnect.enabled && self.engine.reconnect.max_attempts == 0 {
            errors.push(ConfigError::warning(
                "engine.reconnect.max_attempts",
                "auto-reconnect is enabled but max_attempts is 0; no retries will happen",
            ));
        }

        if self.snapshots.capacity == 0 {
            errors.push(ConfigError::error(
                "snapshots.capacity",
                "capacity must be at least 1",
            ));
        }

        if self.snapshots.downsample == 0 {
            errors.push(ConfigError::warning(
                "snapshots.downsample",
                "downsample 0 is treated as 1 (keep every snapshot)",
            ));
        }

        errors.extend(self.simulation.validate());
        errors
    }
}
