//! Event emitter implementation.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use super::error::{ListenerError, ListenerFailure};
use super::sink::{ErrorSink, TracingSink};
use crate::id::{IdGenerator, UuidGenerator};

/// Value a listener returns; `Err` is reported, never propagated.
pub type ListenerResult = Result<(), Box<dyn std::error::Error>>;

/// A registered listener callback.
pub type Listener<P> = Rc<dyn Fn(&P) -> ListenerResult>;

/// Opaque handle identifying one listener registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Returns the underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SubscriptionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SubscriptionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct ListenerRecord<P> {
    id: SubscriptionId,
    callback: Listener<P>,
}

struct Inner<P> {
    listeners: HashMap<String, Vec<ListenerRecord<P>>>,
    disposed: bool,
}

/// Generic, synchronous, multi-listener publish/subscribe.
///
/// # Dispatch Semantics
///
/// - Listeners for an event run synchronously in registration order
/// - The listener list is snapshotted when dispatch starts: `on`/`off`
///   called from inside a listener take effect from the next `emit`
/// - A listener that returns `Err` or panics is isolated; the failure goes
///   to the configured [`ErrorSink`] and dispatch continues
///
/// No internal borrow is held while a listener runs, so listeners may freely
/// call back into the emitter.
///
/// # Panicking Listeners
///
/// A panic is caught with [`std::panic::catch_unwind`] and reported like any
/// other failure, but the process-wide panic hook still runs first. With the
/// default hook that prints a `thread '..' panicked at` line to stderr, where
/// it interleaves with log output. Hosts that need a clean stderr should
/// install their own hook with [`std::panic::set_hook`]. Under
/// `panic = "abort"` nothing is isolated.
///
/// ```
/// use navwatch::emitter::{CollectingSink, EventEmitter};
/// use navwatch::id::SequentialIds;
/// use std::rc::Rc;
///
/// let sink = Rc::new(CollectingSink::new());
/// let emitter: EventEmitter<u32> =
///     EventEmitter::with_parts(SequentialIds::new("sub"), sink.clone());
/// emitter.on("tick", |_| panic!("listener bug"));
/// emitter.on("tick", |_| Ok(()));
///
/// assert_eq!(emitter.emit("tick", &1), 2);
/// assert_eq!(sink.len(), 1);
/// ```
///
/// # Example
///
/// ```
/// use navwatch::emitter::EventEmitter;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let emitter: EventEmitter<u32> = EventEmitter::new();
/// let total = Rc::new(Cell::new(0));
/// let sum = Rc::clone(&total);
/// let id = emitter.on("tick", move |n| {
///     sum.set(sum.get() + n);
///     Ok(())
/// });
///
/// emitter.emit("tick", &2);
/// emitter.emit("tick", &3);
/// assert_eq!(total.get(), 5);
///
/// emitter.off(&id);
/// assert_eq!(emitter.emit("tick", &10), 0);
/// ```
pub struct EventEmitter<P> {
    inner: RefCell<Inner<P>>,
    ids: Box<dyn IdGenerator>,
    sink: Rc<dyn ErrorSink>,
}

impl<P> EventEmitter<P> {
    /// Creates an emitter with UUID subscription ids and a tracing sink.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(UuidGenerator, Rc::new(TracingSink))
    }

    /// Creates an emitter with injected id generator and error sink.
    #[must_use]
    pub fn with_parts(ids: impl IdGenerator + 'static, sink: Rc<dyn ErrorSink>) -> Self {
        Self {
            inner: RefCell::new(Inner {
                listeners: HashMap::new(),
                disposed: false,
            }),
            ids: Box::new(ids),
            sink,
        }
    }

    /// Appends a listener for `event`.
    ///
    /// After [`dispose`](Self::dispose) the returned id is never dispatched.
    pub fn on(
        &self,
        event: &str,
        callback: impl Fn(&P) -> ListenerResult + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.ids.new_id());
        let mut inner = self.inner.borrow_mut();

        if inner.disposed {
            tracing::debug!("Ignoring listener {id} for '{event}' on disposed emitter");
            return id;
        }

        inner
            .listeners
            .entry(event.to_string())
            .or_default()
            .push(ListenerRecord {
                id: id.clone(),
                callback: Rc::new(callback),
            });
        id
    }

    /// Removes exactly one listener. Returns true if it was registered.
    pub fn off(&self, id: &SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let mut emptied = None;
        let mut removed = false;

        for (event, records) in &mut inner.listeners {
            if let Some(pos) = records.iter().position(|r| &r.id == id) {
                records.remove(pos);
                removed = true;
                if records.is_empty() {
                    emptied = Some(event.clone());
                }
                break;
            }
        }

        if let Some(event) = emptied {
            inner.listeners.remove(&event);
        }
        removed
    }

    /// Dispatches `payload` to every listener of `event`.
    ///
    /// Returns the number of listeners invoked, including failed ones.
    pub fn emit(&self, event: &str, payload: &P) -> usize {
        let snapshot: Vec<(SubscriptionId, Listener<P>)> = {
            let inner = self.inner.borrow();
            if inner.disposed {
                return 0;
            }
            inner
                .listeners
                .get(event)
                .map(|records| {
                    records
                        .iter()
                        .map(|r| (r.id.clone(), Rc::clone(&r.callback)))
                        .collect()
                })
                .unwrap_or_default()
        };

        for (id, callback) in &snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(payload)));

            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(ListenerFailure::Returned(e.to_string())),
                Err(panic) => Some(ListenerFailure::Panicked(panic_message(panic.as_ref()))),
            };

            if let Some(reason) = failure {
                self.sink.report(&ListenerError {
                    event: event.to_string(),
                    subscription: id.clone(),
                    reason,
                });
            }
        }

        snapshot.len()
    }

    /// Removes every listener; later `emit` calls are no-ops.
    pub fn dispose(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.listeners.clear();
        inner.disposed = true;
    }

    /// Returns true once [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }

    /// Returns the number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.borrow().listeners.get(event).map_or(0, Vec::len)
    }
}

impl<P> Default for EventEmitter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventEmitter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let counts: HashMap<&str, usize> = inner
            .listeners
            .iter()
            .map(|(event, records)| (event.as_str(), records.len()))
            .collect();

        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .field("disposed", &inner.disposed)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
