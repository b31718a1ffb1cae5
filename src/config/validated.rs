//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the replay tool. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::browser::NativeEvent;
use crate::monitor::MonitorOptions;

use super::cli::ReplayArgs;
use super::defaults;
use super::error::ConfigError;
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the replay tool.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    /// Path to the replay script
    pub script: PathBuf,

    /// Signal sources for the monitor
    pub monitor: MonitorOptions,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let poll = self
            .monitor
            .poll_interval
            .map_or_else(|| "off".to_string(), |d| format!("{}ms", d.as_millis()));
        let events: Vec<&str> = self
            .monitor
            .native_events
            .iter()
            .map(|e| e.as_str())
            .collect();

        write!(
            f,
            "Config {{ script: {}, poll: {}, intercept_history: {}, events: [{}] }}",
            self.script.display(),
            poll,
            self.monitor.intercept_history,
            events.join(", "),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values, which take
    /// precedence over built-in defaults.
    ///
    /// # Boolean Flag Semantics
    ///
    /// `--no-poll` and `--no-history` only disable: if either CLI or TOML
    /// turns a source off, it stays off.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The poll interval is zero
    /// - An event name is unknown
    pub fn from_raw(args: &ReplayArgs, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let section = toml.map(|t| &t.monitor);

        let poll_disabled = args.no_poll || section.and_then(|s| s.poll) == Some(false);
        let poll_interval = Self::resolve_poll_interval(args, toml)?;

        let intercept_history =
            !(args.no_history || section.and_then(|s| s.intercept_history) == Some(false));

        let native_events = Self::resolve_events(args, toml)?;

        let mut monitor = MonitorOptions::default().with_native_events(native_events);
        monitor = if poll_disabled {
            monitor.without_polling()
        } else {
            monitor.with_poll_interval(poll_interval)
        };
        if !intercept_history {
            monitor = monitor.without_history_interception();
        }

        Ok(Self {
            script: args.script.clone(),
            monitor,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `args.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(args: &ReplayArgs) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = args.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(args, toml.as_ref())
    }

    fn resolve_poll_interval(
        args: &ReplayArgs,
        toml: Option<&TomlConfig>,
    ) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let millis = args
            .poll_interval_ms
            .or_else(|| toml.and_then(|t| t.monitor.poll_interval_ms))
            .unwrap_or(defaults::POLL_INTERVAL_MS);

        if millis == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "poll_interval_ms",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_millis(millis))
    }

    fn resolve_events(
        args: &ReplayArgs,
        toml: Option<&TomlConfig>,
    ) -> Result<Vec<NativeEvent>, ConfigError> {
        // CLI list replaces TOML list entirely
        if !args.events.is_empty() {
            return parse_events(&args.events);
        }

        match toml.and_then(|t| t.monitor.events.as_ref()) {
            Some(events) => parse_events(events),
            None => Ok(defaults::NATIVE_EVENTS.to_vec()),
        }
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_events(names: &[String]) -> Result<Vec<NativeEvent>, ConfigError> {
    names
        .iter()
        .map(|name| {
            name.parse::<NativeEvent>()
                .map_err(|reason| ConfigError::InvalidEvent {
                    value: name.clone(),
                    reason,
                })
        })
        .collect()
}
