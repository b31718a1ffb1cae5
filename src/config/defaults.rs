//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

use crate::browser::NativeEvent;

/// Default polling interval in milliseconds.
pub const POLL_INTERVAL_MS: u64 = 1000;

/// Native events subscribed to by default.
pub const NATIVE_EVENTS: [NativeEvent; 2] = NativeEvent::ALL;

/// Default output path for `init`.
pub const CONFIG_FILE: &str = "navwatch.toml";

/// Default polling interval as Duration.
#[must_use]
pub const fn poll_interval() -> Duration {
    Duration::from_millis(POLL_INTERVAL_MS)
}
