//! Error types for listener dispatch.

use super::SubscriptionId;
use thiserror::Error;

/// How a listener failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerFailure {
    /// The listener returned an error.
    #[error("returned error: {0}")]
    Returned(String),

    /// The listener panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// A listener failed while an event was being dispatched.
///
/// The failure is isolated to that listener: dispatch continues with the
/// remaining listeners and the error is handed to the emitter's
/// [`super::ErrorSink`] rather than returned to the emitting caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Listener {subscription} for '{event}' {reason}")]
pub struct ListenerError {
    /// The event being dispatched.
    pub event: String,
    /// The failing listener.
    pub subscription: SubscriptionId,
    /// What went wrong.
    #[source]
    pub reason: ListenerFailure,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn error(reason: ListenerFailure) -> ListenerError {
        ListenerError {
            event: "urlChanged".to_string(),
            subscription: SubscriptionId::from("sub-1"),
            reason,
        }
    }

    #[test]
    fn returned_error_displays_with_context() {
        let err = error(ListenerFailure::Returned("boom".to_string()));

        assert_eq!(
            err.to_string(),
            "Listener sub-1 for 'urlChanged' returned error: boom"
        );
    }

    #[test]
    fn panic_displays_with_context() {
        let err = error(ListenerFailure::Panicked("oops".to_string()));

        assert!(err.to_string().contains("panicked: oops"));
    }

    #[test]
    fn preserves_source() {
        let err = error(ListenerFailure::Returned("inner".to_string()));

        let source = err.source();
        assert!(source.is_some());
        assert!(source.unwrap().to_string().contains("inner"));
    }
}
