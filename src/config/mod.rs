//! Configuration layer for navwatch.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`], [`ReplayArgs`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! The event list from `--events` **replaces** the TOML list entirely (not merged).
//!
//! # Boolean Flag Semantics
//!
//! `--no-poll` and `--no-history` use OR semantics with their TOML
//! counterparts (`poll = false`, `intercept_history = false`): once a source
//! is disabled by either, the CLI cannot re-enable it.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod cli_tests;

pub use cli::{Cli, Command, ReplayArgs};
pub use error::ConfigError;
pub use toml::{MonitorSection, TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
