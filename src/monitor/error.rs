//! Error types for the monitor layer.

use std::fmt;

use thiserror::Error;

use super::SnapshotError;
use crate::timer::ScheduleError;

/// Error type for monitor lifecycle operations.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The host exposes no way to read the current URL.
    ///
    /// The monitor stays in its current phase.
    #[error("Unsupported environment: no location accessor available")]
    UnsupportedEnvironment,

    /// The current location could not be parsed when starting.
    #[error("Cannot capture initial location: {0}")]
    InvalidLocation(#[from] SnapshotError),

    /// The poll fallback could not be scheduled.
    #[error("Failed to schedule poll fallback: {0}")]
    Schedule(#[from] ScheduleError),
}

/// A signal source that can be attached to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// `pushState`/`replaceState` interception.
    HistoryApi,
    /// `popstate`/`hashchange` notifications.
    NativeEvents,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HistoryApi => f.write_str("history API"),
            Self::NativeEvents => f.write_str("native events"),
        }
    }
}

/// A signal source was unavailable when starting.
///
/// Not fatal: the monitor degrades to the sources it could attach.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot attach {signal} signal: {reason}")]
pub struct SignalAttachFailure {
    /// The source that was skipped.
    pub signal: SignalKind,
    /// Why it was skipped.
    pub reason: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::time::Duration;

    #[test]
    fn unsupported_environment_displays_message() {
        let error = MonitorError::UnsupportedEnvironment;
        assert!(error.to_string().contains("no location accessor"));
    }

    #[test]
    fn schedule_error_preserves_source() {
        let error: MonitorError = ScheduleError::InvalidInterval {
            requested: Duration::ZERO,
        }
        .into();

        assert!(matches!(error, MonitorError::Schedule(_)));
        assert!(error.source().is_some());
    }

    #[test]
    fn invalid_location_from_snapshot_error() {
        let error: MonitorError = SnapshotError::InvalidUrl {
            href: "nope".to_string(),
            reason: "relative URL without a base".to_string(),
        }
        .into();

        assert!(error.to_string().contains("nope"));
    }

    #[test]
    fn attach_failure_names_signal() {
        let failure = SignalAttachFailure {
            signal: SignalKind::HistoryApi,
            reason: "no history object",
        };

        assert_eq!(
            failure.to_string(),
            "Cannot attach history API signal: no history object"
        );
    }
}
