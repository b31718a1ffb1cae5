//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// navwatch: URL change monitor
///
/// Replays navigation scripts against an in-memory browser window and
/// prints every detected URL change as a JSON line.
#[derive(Debug, Parser)]
#[command(name = "navwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for navwatch
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = super::defaults::CONFIG_FILE)]
        output: PathBuf,
    },

    /// Run a navigation script and print detected URL changes
    Replay(ReplayArgs),
}

/// Arguments of the `replay` subcommand.
#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Path to the replay script (TOML)
    pub script: PathBuf,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Polling interval in milliseconds
    #[arg(long = "poll-interval-ms", value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Disable the polling fallback
    #[arg(long = "no-poll")]
    pub no_poll: bool,

    /// Disable pushState/replaceState interception
    #[arg(long = "no-history")]
    pub no_history: bool,

    /// Native events to subscribe to (comma-separated: popstate,hashchange)
    #[arg(long, value_delimiter = ',', value_name = "EVENT")]
    pub events: Vec<String>,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Command::Init { .. })
    }
}
