//! Host browsing-context boundary.
//!
//! The monitor never touches a global window. Everything it needs from the
//! host environment goes through the traits defined here:
//! - [`BrowsingContext`]: the accessor for location, history and events
//! - [`HistoryApi`]: replaceable history mutation methods
//! - [`EventTarget`]: attach/detach of native navigation notifications
//!
//! [`MemoryWindow`] is a complete in-memory implementation used by tests and
//! the replay tool.

mod error;
mod memory;

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use error::NavigationError;
pub use memory::MemoryWindow;

/// A history mutation method as installed on the history object.
///
/// Hosts and the monitor may replace installed methods; callers must always
/// dispatch through whatever is currently installed.
pub type HistoryFn = Rc<dyn Fn(&HistoryCall) -> Result<(), NavigationError>>;

/// Handler invoked when a native navigation event fires.
pub type EventHandler = Rc<dyn Fn()>;

/// Removes exactly the handler it was returned for.
pub type DetachFn = Box<dyn FnOnce()>;

/// The history methods that can change the visible URL without navigating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryMethod {
    /// Adds a session history entry.
    PushState,
    /// Rewrites the current session history entry.
    ReplaceState,
}

impl HistoryMethod {
    /// Both methods, in a stable order.
    pub const ALL: [Self; 2] = [Self::PushState, Self::ReplaceState];

    /// Returns the host-facing method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PushState => "pushState",
            Self::ReplaceState => "replaceState",
        }
    }
}

impl fmt::Display for HistoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native notifications fired on navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeEvent {
    /// Back/forward traversal (and fragment navigation).
    PopState,
    /// Fragment-only URL change.
    HashChange,
}

impl NativeEvent {
    /// Every native event type.
    pub const ALL: [Self; 2] = [Self::PopState, Self::HashChange];

    /// Returns the host-facing event name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PopState => "popstate",
            Self::HashChange => "hashchange",
        }
    }
}

impl fmt::Display for NativeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NativeEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "popstate" => Ok(Self::PopState),
            "hashchange" => Ok(Self::HashChange),
            other => Err(format!(
                "unknown event '{other}': expected popstate or hashchange"
            )),
        }
    }
}

/// Arguments of a history mutation call.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryCall {
    /// Serializable state object attached to the entry.
    pub state: serde_json::Value,
    /// Legacy title argument, ignored by browsers.
    pub title: String,
    /// Target URL, relative to the current location. `None` keeps the URL.
    pub url: Option<String>,
}

impl HistoryCall {
    /// Creates a call targeting `url` with a null state.
    #[must_use]
    pub fn to(url: impl Into<String>) -> Self {
        Self {
            state: serde_json::Value::Null,
            title: String::new(),
            url: Some(url.into()),
        }
    }

    /// Creates a call that only updates state, keeping the URL.
    #[must_use]
    pub const fn state_only(state: serde_json::Value) -> Self {
        Self {
            state,
            title: String::new(),
            url: None,
        }
    }

    /// Sets the state object.
    #[must_use]
    pub fn with_state(mut self, state: serde_json::Value) -> Self {
        self.state = state;
        self
    }
}

/// History object with replaceable mutation methods.
pub trait HistoryApi {
    /// Returns the currently installed implementation of `kind`.
    fn method(&self, kind: HistoryMethod) -> HistoryFn;

    /// Installs a new implementation of `kind`.
    fn set_method(&self, kind: HistoryMethod, method: HistoryFn);

    /// Calls the installed `pushState`.
    ///
    /// # Errors
    ///
    /// Returns whatever the installed method returns.
    fn push_state(&self, call: &HistoryCall) -> Result<(), NavigationError> {
        let method = self.method(HistoryMethod::PushState);
        method(call)
    }

    /// Calls the installed `replaceState`.
    ///
    /// # Errors
    ///
    /// Returns whatever the installed method returns.
    fn replace_state(&self, call: &HistoryCall) -> Result<(), NavigationError> {
        let method = self.method(HistoryMethod::ReplaceState);
        method(call)
    }
}

/// Target for native navigation notifications.
pub trait EventTarget {
    /// Attaches `handler` to `event`.
    ///
    /// Calling the returned [`DetachFn`] removes exactly this handler.
    fn attach(&self, event: NativeEvent, handler: EventHandler) -> DetachFn;
}

/// Accessor for the current browsing context.
///
/// Each capability is optional so that non-browser or restricted hosts can
/// expose only what they have.
pub trait BrowsingContext {
    /// Returns the current location href, or `None` if it cannot be read.
    fn location(&self) -> Option<String>;

    /// Returns the history object, if available.
    fn history(&self) -> Option<Rc<dyn HistoryApi>>;

    /// Returns the native event target, if available.
    fn events(&self) -> Option<Rc<dyn EventTarget>>;
}
