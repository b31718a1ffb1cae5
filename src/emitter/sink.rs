//! Destinations for listener failures.

use std::cell::RefCell;
use std::rc::Rc;

use super::ListenerError;

/// Receives listener failures isolated during dispatch.
///
/// Failures are never silently swallowed: every emitter reports to a sink.
pub trait ErrorSink {
    /// Reports one failure.
    fn report(&self, error: &ListenerError);
}

/// Default sink logging failures at `warn` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, error: &ListenerError) {
        tracing::warn!("{error}");
    }
}

/// Sink keeping every failure for later inspection.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    errors: Rc<RefCell<Vec<ListenerError>>>,
}

impl CollectingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every failure reported so far.
    #[must_use]
    pub fn errors(&self) -> Vec<ListenerError> {
        self.errors.borrow().clone()
    }

    /// Returns the number of failures reported so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.borrow().len()
    }

    /// Returns true if nothing has been reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }
}

impl ErrorSink for CollectingSink {
    fn report(&self, error: &ListenerError) {
        self.errors.borrow_mut().push(error.clone());
    }
}
