//! Error types for host navigation.

use thiserror::Error;

/// Error returned by history mutation methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// The target could not be resolved to a URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The target URL is on a different origin than the current document.
    #[error("Cannot change origin from {current} to {requested}")]
    SecurityError {
        /// Origin of the current document.
        current: String,
        /// Origin the call asked for.
        requested: String,
    },
}
