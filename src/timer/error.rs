//! Error types for the timer layer.

use std::time::Duration;
use thiserror::Error;

/// Error type for scheduling requests.
///
/// Invalid requests are rejected synchronously at the call site; the
/// scheduler never clamps them to a usable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// The requested interval or delay is shorter than one millisecond.
    #[error("Invalid interval {requested:?}: must be at least 1ms")]
    InvalidInterval {
        /// The rejected duration.
        requested: Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_interval_displays_requested_duration() {
        let error = ScheduleError::InvalidInterval {
            requested: Duration::ZERO,
        };

        assert!(error.to_string().contains("Invalid interval"));
        assert!(error.to_string().contains("0ns"));
    }
}
