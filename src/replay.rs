//! Replay execution logic.
//!
//! This module loads a navigation script, drives an in-memory window through
//! it while a [`UrlMonitor`] watches, and writes every detected change as a
//! JSON line.

use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use navwatch::browser::{MemoryWindow, NavigationError};
use navwatch::config::ValidatedConfig;
use navwatch::monitor::{MonitorError, MonitorOptions, UrlChangeEvent, UrlMonitor};
use navwatch::timer::{Scheduler, TokioTimer};

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;

/// Error type for replay failures.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Failed to read the script file.
    #[error("Failed to read script '{}': {source}", path.display())]
    ScriptRead {
        /// Path to the script
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the script.
    #[error("Failed to parse script: {0}")]
    ScriptParse(#[from] toml::de::Error),

    /// The script's initial URL is not absolute.
    #[error("Invalid initial URL: {0}")]
    InitialUrl(#[source] NavigationError),

    /// The monitor could not start.
    #[error("Failed to start monitor: {0}")]
    Monitor(#[from] MonitorError),

    /// A navigation step was rejected by the window.
    #[error("Step {index} ({action}) failed: {source}")]
    Step {
        /// 1-based step number
        index: usize,
        /// Step action name
        action: &'static str,
        /// Navigation error
        #[source]
        source: NavigationError,
    },

    /// Failed to encode an event.
    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    /// Failed to write an event.
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// A navigation script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Location the window starts at
    pub initial_url: String,

    /// Steps in execution order
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Step {
    /// `history.pushState` to `url`
    Push { url: String },
    /// `history.replaceState` to `url`
    Replace { url: String },
    /// Traverse one entry back
    Back,
    /// Traverse one entry forward
    Forward,
    /// Assign `location.hash`
    Hash { fragment: String },
    /// Change the location without any notification
    Assign { url: String },
    /// Let `ms` milliseconds of time pass
    Wait { ms: u64 },
    /// Run an explicit check
    Check,
}

impl Step {
    /// Returns the script action name.
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Push { .. } => "push",
            Self::Replace { .. } => "replace",
            Self::Back => "back",
            Self::Forward => "forward",
            Self::Hash { .. } => "hash",
            Self::Assign { .. } => "assign",
            Self::Wait { .. } => "wait",
            Self::Check => "check",
        }
    }
}

impl Script {
    /// Loads a script from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let content = std::fs::read_to_string(path).map_err(|e| ReplayError::ScriptRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses a script from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ReplayError> {
        toml::from_str(content).map_err(ReplayError::from)
    }
}

/// Loads the configured script and replays it.
///
/// Must run inside a [`tokio::task::LocalSet`].
///
/// # Errors
///
/// Returns an error if the script cannot be loaded or replayed.
pub async fn run<W: Write>(config: &ValidatedConfig, out: &mut W) -> Result<usize, ReplayError> {
    let script = Script::load(&config.script)?;
    execute(&config.monitor, &script, out).await
}

/// Replays `script`, writing one JSON line per detected change to `out`.
///
/// Returns the number of changes written. Must run inside a
/// [`tokio::task::LocalSet`].
///
/// # Errors
///
/// Returns an error if the window or monitor cannot be set up, a step is
/// rejected, or output fails.
pub async fn execute<W: Write>(
    options: &MonitorOptions,
    script: &Script,
    out: &mut W,
) -> Result<usize, ReplayError> {
    let window = MemoryWindow::new(&script.initial_url).map_err(ReplayError::InitialUrl)?;
    let scheduler = Scheduler::new(TokioTimer::new());
    let monitor = UrlMonitor::new(window.clone(), scheduler, options.clone());

    let detected: Rc<RefCell<Vec<UrlChangeEvent>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let detected = Rc::clone(&detected);
        monitor.on_url_changed(move |event| {
            detected.borrow_mut().push(event.clone());
            Ok(())
        });
    }

    monitor.start()?;
    tracing::info!(
        "Replaying {} step(s) from {}",
        script.steps.len(),
        script.initial_url
    );

    let mut written = 0;
    for (i, step) in script.steps.iter().enumerate() {
        let index = i + 1;
        tracing::debug!("Step {index}: {step:?}");
        perform(&window, &monitor, step)
            .await
            .map_err(|source| ReplayError::Step {
                index,
                action: step.action(),
                source,
            })?;

        written += flush(&detected, out)?;
    }

    monitor.stop();
    Ok(written)
}

async fn perform(
    window: &MemoryWindow,
    monitor: &UrlMonitor,
    step: &Step,
) -> Result<(), NavigationError> {
    match step {
        Step::Push { url } => window.push(url)?,
        Step::Replace { url } => window.replace(url)?,
        Step::Back => {
            if !window.back() {
                tracing::warn!("No earlier history entry, back ignored");
            }
        }
        Step::Forward => {
            if !window.forward() {
                tracing::warn!("No later history entry, forward ignored");
            }
        }
        Step::Hash { fragment } => {
            if !window.set_hash(fragment) {
                tracing::debug!("Fragment already #{fragment}");
            }
        }
        Step::Assign { url } => window.assign_silently(url)?,
        Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
        Step::Check => monitor.check_now(),
    }
    Ok(())
}

fn flush<W: Write>(
    detected: &RefCell<Vec<UrlChangeEvent>>,
    out: &mut W,
) -> Result<usize, ReplayError> {
    let events = std::mem::take(&mut *detected.borrow_mut());
    for event in &events {
        let line = serde_json::to_string(event)?;
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(events.len())
}
