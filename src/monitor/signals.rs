//! Signal source attachment for the URL monitor.
//!
//! This module owns everything the monitor attaches to the host:
//! - [`HistoryInterception`]: wrap-and-delegate over `pushState`/`replaceState`
//! - [`Attachments`]: the full set of live registrations for one watch session

use std::cell::Cell;
use std::rc::Rc;

use crate::browser::{DetachFn, HistoryApi, HistoryCall, HistoryFn, HistoryMethod, NativeEvent};
use crate::timer::{Scheduler, TimerHandle};

struct Installed {
    kind: HistoryMethod,
    original: HistoryFn,
    wrapper: HistoryFn,
    active: Rc<Cell<bool>>,
}

/// Wrappers installed over the host's history mutation methods.
///
/// # Wrap-and-delegate Contract
///
/// Each wrapper calls the method it replaced with the identical arguments
/// first, and returns that method's result unchanged. Only after a
/// successful call does it notify the monitor. A failed call leaves the URL
/// untouched, so there is nothing to check.
pub struct HistoryInterception {
    history: Rc<dyn HistoryApi>,
    installed: Vec<Installed>,
}

impl HistoryInterception {
    /// Wraps both history methods, invoking `on_call` after each successful call.
    pub fn install(history: Rc<dyn HistoryApi>, on_call: Rc<dyn Fn(HistoryMethod)>) -> Self {
        let installed = HistoryMethod::ALL
            .into_iter()
            .map(|kind| {
                let original = history.method(kind);
                let active = Rc::new(Cell::new(true));
                let wrapper = wrap(kind, Rc::clone(&original), Rc::clone(&active), Rc::clone(&on_call));
                history.set_method(kind, Rc::clone(&wrapper));
                Installed {
                    kind,
                    original,
                    wrapper,
                    active,
                }
            })
            .collect();

        Self { history, installed }
    }

    /// Removes the wrappers.
    ///
    /// A wrapper still installed is replaced by the original. If the host
    /// wrapped on top of ours, ours stays in its chain as a pure delegate so
    /// the host's wrapper keeps working.
    pub fn uninstall(self) {
        for entry in self.installed {
            entry.active.set(false);

            let current = self.history.method(entry.kind);
            if Rc::ptr_eq(&current, &entry.wrapper) {
                self.history.set_method(entry.kind, entry.original);
            } else {
                tracing::debug!(
                    "{} was re-wrapped by the host, leaving inert delegate in place",
                    entry.kind
                );
            }
        }
    }
}

fn wrap(
    kind: HistoryMethod,
    original: HistoryFn,
    active: Rc<Cell<bool>>,
    on_call: Rc<dyn Fn(HistoryMethod)>,
) -> HistoryFn {
    Rc::new(move |call: &HistoryCall| {
        let result = original(call);
        if result.is_ok() && active.get() {
            on_call(kind);
        }
        result
    })
}

/// Live registrations of one watch session.
#[derive(Default)]
pub struct Attachments {
    pub history: Option<HistoryInterception>,
    pub listeners: Vec<(NativeEvent, DetachFn)>,
    pub poll: Option<TimerHandle>,
}

impl Attachments {
    /// Returns the native events currently attached.
    pub fn events(&self) -> Vec<NativeEvent> {
        self.listeners.iter().map(|(event, _)| *event).collect()
    }

    /// Detaches every registration.
    pub fn release(self, scheduler: &Scheduler) {
        if let Some(handle) = self.poll {
            scheduler.cancel(&handle);
        }
        for (_, detach) in self.listeners {
            detach();
        }
        if let Some(history) = self.history {
            history.uninstall();
        }
    }
}
