//! In-memory browsing context.
//!
//! [`MemoryWindow`] models the parts of a browser window the monitor
//! observes: a session history stack, replaceable `pushState`/`replaceState`
//! methods, and `popstate`/`hashchange` notifications.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use url::Url;

use super::{
    BrowsingContext, DetachFn, EventHandler, EventTarget, HistoryApi, HistoryCall, HistoryFn,
    HistoryMethod, NativeEvent, NavigationError,
};

#[derive(Debug, Clone, Copy)]
enum Commit {
    Push,
    Replace,
}

struct Entry {
    url: Url,
    state: serde_json::Value,
}

struct Registered {
    id: u64,
    event: NativeEvent,
    handler: EventHandler,
}

struct WindowState {
    entries: Vec<Entry>,
    index: usize,
    push: HistoryFn,
    replace: HistoryFn,
    listeners: Vec<Registered>,
    next_listener: u64,
}

impl WindowState {
    fn current(&self) -> &Entry {
        &self.entries[self.index]
    }

    fn push_entry(&mut self, entry: Entry) {
        self.entries.truncate(self.index + 1);
        self.entries.push(entry);
        self.index = self.entries.len() - 1;
    }
}

struct Shared {
    state: RefCell<WindowState>,
    native_push: HistoryFn,
    native_replace: HistoryFn,
    has_location: Cell<bool>,
    has_history: Cell<bool>,
    has_events: Cell<bool>,
}

impl Shared {
    fn commit(&self, call: &HistoryCall, mode: Commit) -> Result<(), NavigationError> {
        let mut state = self.state.borrow_mut();
        let current = state.current().url.clone();

        let target = match call.url.as_deref() {
            None => current.clone(),
            Some(raw) => resolve(&current, raw)?,
        };

        if target.origin() != current.origin() {
            return Err(NavigationError::SecurityError {
                current: current.origin().ascii_serialization(),
                requested: target.origin().ascii_serialization(),
            });
        }

        let entry = Entry {
            url: target,
            state: call.state.clone(),
        };
        match mode {
            Commit::Push => state.push_entry(entry),
            Commit::Replace => {
                let index = state.index;
                state.entries[index] = entry;
            }
        }
        Ok(())
    }

    fn dispatch(&self, event: NativeEvent) {
        let handlers: Vec<EventHandler> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|r| r.event == event)
            .map(|r| Rc::clone(&r.handler))
            .collect();

        for handler in handlers {
            handler();
        }
    }
}

/// In-memory browser window.
///
/// Clones share the same window. Capabilities can be removed with the
/// `without_*` builders to model restricted or non-browser hosts.
///
/// # Example
///
/// ```
/// use navwatch::browser::{BrowsingContext, MemoryWindow};
///
/// let window = MemoryWindow::new("https://a.test/").unwrap();
/// window.push("/b?q=1").unwrap();
/// assert_eq!(window.location().as_deref(), Some("https://a.test/b?q=1"));
///
/// window.back();
/// assert_eq!(window.href(), "https://a.test/");
/// ```
#[derive(Clone)]
pub struct MemoryWindow {
    shared: Rc<Shared>,
}

impl MemoryWindow {
    /// Creates a window whose only history entry is `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::InvalidUrl`] if `initial` is not an absolute URL.
    pub fn new(initial: &str) -> Result<Self, NavigationError> {
        let url = Url::parse(initial).map_err(|e| NavigationError::InvalidUrl {
            url: initial.to_string(),
            reason: e.to_string(),
        })?;

        let shared = Rc::new_cyclic(|weak: &Weak<Shared>| {
            let native_push = native_method(weak.clone(), Commit::Push);
            let native_replace = native_method(weak.clone(), Commit::Replace);

            Shared {
                state: RefCell::new(WindowState {
                    entries: vec![Entry {
                        url,
                        state: serde_json::Value::Null,
                    }],
                    index: 0,
                    push: Rc::clone(&native_push),
                    replace: Rc::clone(&native_replace),
                    listeners: Vec::new(),
                    next_listener: 0,
                }),
                native_push,
                native_replace,
                has_location: Cell::new(true),
                has_history: Cell::new(true),
                has_events: Cell::new(true),
            }
        });

        Ok(Self { shared })
    }

    /// Hides the history object from [`BrowsingContext::history`].
    #[must_use]
    pub fn without_history(self) -> Self {
        self.shared.has_history.set(false);
        self
    }

    /// Hides the event target from [`BrowsingContext::events`].
    #[must_use]
    pub fn without_events(self) -> Self {
        self.shared.has_events.set(false);
        self
    }

    /// Hides the location from [`BrowsingContext::location`].
    #[must_use]
    pub fn without_location(self) -> Self {
        self.shared.has_location.set(false);
        self
    }

    /// Returns the current href regardless of capabilities.
    #[must_use]
    pub fn href(&self) -> String {
        self.shared.state.borrow().current().url.to_string()
    }

    /// Returns the state object of the current entry.
    #[must_use]
    pub fn current_state(&self) -> serde_json::Value {
        self.shared.state.borrow().current().state.clone()
    }

    /// Returns the number of session history entries.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.shared.state.borrow().entries.len()
    }

    /// Calls the installed `pushState` with `url`.
    ///
    /// # Errors
    ///
    /// Returns whatever the installed method returns.
    pub fn push(&self, url: &str) -> Result<(), NavigationError> {
        self.push_state(&HistoryCall::to(url))
    }

    /// Calls the installed `replaceState` with `url`.
    ///
    /// # Errors
    ///
    /// Returns whatever the installed method returns.
    pub fn replace(&self, url: &str) -> Result<(), NavigationError> {
        self.replace_state(&HistoryCall::to(url))
    }

    /// Traverses one entry back. Returns false at the start of history.
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Traverses one entry forward. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Traverses `delta` entries, firing `popstate` (and `hashchange` when
    /// only the fragment differs). Returns false if out of range.
    pub fn go(&self, delta: isize) -> bool {
        let (old, new) = {
            let mut state = self.shared.state.borrow_mut();
            let Some(target) = state
                .index
                .checked_add_signed(delta)
                .filter(|&i| i < state.entries.len() && delta != 0)
            else {
                return false;
            };
            let old = state.current().url.clone();
            state.index = target;
            (old, state.current().url.clone())
        };

        self.shared.dispatch(NativeEvent::PopState);
        if differs_only_in_fragment(&old, &new) {
            self.shared.dispatch(NativeEvent::HashChange);
        }
        true
    }

    /// Navigates to a fragment like assigning `location.hash`.
    ///
    /// Pushes an entry and fires `popstate` then `hashchange`. Setting the
    /// current fragment again does nothing and returns false.
    pub fn set_hash(&self, fragment: &str) -> bool {
        let fragment = fragment.trim_start_matches('#');
        {
            let mut state = self.shared.state.borrow_mut();
            let mut target = state.current().url.clone();
            target.set_fragment(Some(fragment));
            if target == state.current().url {
                return false;
            }
            state.push_entry(Entry {
                url: target,
                state: serde_json::Value::Null,
            });
        }

        self.shared.dispatch(NativeEvent::PopState);
        self.shared.dispatch(NativeEvent::HashChange);
        true
    }

    /// Changes the location without any notification.
    ///
    /// Models out-of-band location changes that only polling can detect.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::InvalidUrl`] if `url` cannot be resolved.
    pub fn assign_silently(&self, url: &str) -> Result<(), NavigationError> {
        let mut state = self.shared.state.borrow_mut();
        let target = resolve(&state.current().url, url)?;
        state.push_entry(Entry {
            url: target,
            state: serde_json::Value::Null,
        });
        Ok(())
    }

    /// Returns the number of handlers attached for `event`.
    #[must_use]
    pub fn listener_count(&self, event: NativeEvent) -> usize {
        self.shared
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|r| r.event == event)
            .count()
    }

    /// Returns true if the installed `kind` method is the window's own.
    #[must_use]
    pub fn is_native(&self, kind: HistoryMethod) -> bool {
        let installed = self.method(kind);
        let native = match kind {
            HistoryMethod::PushState => &self.shared.native_push,
            HistoryMethod::ReplaceState => &self.shared.native_replace,
        };
        Rc::ptr_eq(&installed, native)
    }
}

impl HistoryApi for MemoryWindow {
    fn method(&self, kind: HistoryMethod) -> HistoryFn {
        let state = self.shared.state.borrow();
        match kind {
            HistoryMethod::PushState => Rc::clone(&state.push),
            HistoryMethod::ReplaceState => Rc::clone(&state.replace),
        }
    }

    fn set_method(&self, kind: HistoryMethod, method: HistoryFn) {
        let mut state = self.shared.state.borrow_mut();
        match kind {
            HistoryMethod::PushState => state.push = method,
            HistoryMethod::ReplaceState => state.replace = method,
        }
    }
}

impl EventTarget for MemoryWindow {
    fn attach(&self, event: NativeEvent, handler: EventHandler) -> DetachFn {
        let id = {
            let mut state = self.shared.state.borrow_mut();
            let id = state.next_listener;
            state.next_listener += 1;
            state.listeners.push(Registered { id, event, handler });
            id
        };

        let weak = Rc::downgrade(&self.shared);
        Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.state.borrow_mut().listeners.retain(|r| r.id != id);
            }
        })
    }
}

impl BrowsingContext for MemoryWindow {
    fn location(&self) -> Option<String> {
        self.shared.has_location.get().then(|| self.href())
    }

    fn history(&self) -> Option<Rc<dyn HistoryApi>> {
        self.shared
            .has_history
            .get()
            .then(|| Rc::new(self.clone()) as Rc<dyn HistoryApi>)
    }

    fn events(&self) -> Option<Rc<dyn EventTarget>> {
        self.shared
            .has_events
            .get()
            .then(|| Rc::new(self.clone()) as Rc<dyn EventTarget>)
    }
}

impl fmt::Debug for MemoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("MemoryWindow")
            .field("href", &state.current().url.as_str())
            .field("index", &state.index)
            .field("entries", &state.entries.len())
            .field("listeners", &state.listeners.len())
            .finish_non_exhaustive()
    }
}

fn native_method(weak: Weak<Shared>, mode: Commit) -> HistoryFn {
    Rc::new(move |call: &HistoryCall| {
        weak.upgrade()
            .map_or(Ok(()), |shared| shared.commit(call, mode))
    })
}

fn resolve(base: &Url, raw: &str) -> Result<Url, NavigationError> {
    base.join(raw).map_err(|e| NavigationError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

fn differs_only_in_fragment(a: &Url, b: &Url) -> bool {
    if a.fragment() == b.fragment() {
        return false;
    }
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
