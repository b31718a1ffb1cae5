//! navwatch: URL change monitor
//!
//! Entry point for the navwatch replay tool.

use navwatch::config::{Cli, Command, ReplayArgs, ValidatedConfig, write_default_config};
use std::process::ExitCode;

mod app;
mod replay;

use app::{exit_code, print_config_hint, setup_tracing};

/// Main entry point.
///
/// Excluded from coverage as it's the thin wrapper around testable components.
#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match &cli.command {
        Command::Init { output } => handle_init(output),
        Command::Replay(args) => handle_replay(args, cli.verbose),
    }
}

/// Handles the `init` subcommand.
fn handle_init(output: &std::path::Path) -> ExitCode {
    match write_default_config(output) {
        Ok(()) => {
            eprintln!("Configuration template written to: {}", output.display());
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code::CONFIG_ERROR
        }
    }
}

/// Handles the `replay` subcommand.
#[cfg(not(tarpaulin_include))]
fn handle_replay(args: &ReplayArgs, verbose: bool) -> ExitCode {
    // Load and validate configuration
    let config = match ValidatedConfig::load(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            return exit_code::CONFIG_ERROR;
        }
    };

    // Setup logging and run
    setup_tracing(verbose);
    tracing::info!("{config}");

    run_application(&config)
}

/// Runs the replay with the given configuration.
///
/// Excluded from coverage - requires async runtime.
#[cfg(not(tarpaulin_include))]
fn run_application(config: &ValidatedConfig) -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create Tokio runtime: {e}");
            return exit_code::runtime_error();
        }
    };

    // Monitor types are !Send: everything runs on one LocalSet
    let local = tokio::task::LocalSet::new();
    let mut stdout = std::io::stdout().lock();

    match local.block_on(&runtime, replay::run(config, &mut stdout)) {
        Ok(count) => {
            tracing::info!("Replay finished, {count} URL change(s) detected");
            exit_code::SUCCESS
        }
        Err(e) => {
            tracing::error!("Replay error: {e}");
            exit_code::runtime_error()
        }
    }
}
