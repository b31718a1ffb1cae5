//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Monitoring configuration
    #[serde(default)]
    pub monitor: MonitorSection,
}

/// Monitoring configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Polling interval in milliseconds
    pub poll_interval_ms: Option<u64>,

    /// Set to false to disable the polling fallback
    pub poll: Option<bool>,

    /// Set to false to leave `pushState`/`replaceState` untouched
    pub intercept_history: Option<bool>,

    /// Native events to subscribe to; an empty list subscribes to none
    pub events: Option<Vec<String>>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# navwatch configuration file

[monitor]
# Polling fallback interval in milliseconds (default: 1000)
# Catches location changes that fire no event.
poll_interval_ms = 1000

# Disable the polling fallback (same as --no-poll)
# poll = false

# Wrap pushState/replaceState to detect SPA navigation (default: true)
# intercept_history = true

# Native events to subscribe to (default: both)
# Note: CLI --events REPLACES this list entirely
events = ["popstate", "hashchange"]
"#
    .to_string()
}
