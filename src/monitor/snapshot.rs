//! URL snapshot and change event types.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use url::Url;

use crate::browser::NativeEvent;

/// Error produced when a location cannot be turned into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// The location is not an absolute URL.
    #[error("Invalid location '{href}': {reason}")]
    InvalidUrl {
        /// The rejected location string.
        href: String,
        /// Parser message.
        reason: String,
    },
}

/// Immutable view of the location at one point in time.
///
/// Components follow `window.location`: `search` keeps its leading `?` and
/// `hash` its leading `#`, and each is empty when absent or bare.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UrlSnapshot {
    /// Normalized full URL.
    pub href: String,
    /// Path component.
    pub pathname: String,
    /// Query component including `?`, or empty.
    pub search: String,
    /// Fragment component including `#`, or empty.
    pub hash: String,
}

impl UrlSnapshot {
    /// Parses a location href into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidUrl`] if `href` is not an absolute URL.
    pub fn parse(href: &str) -> Result<Self, SnapshotError> {
        let url = Url::parse(href).map_err(|e| SnapshotError::InvalidUrl {
            href: href.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_url(&url))
    }

    /// Builds a snapshot from an already parsed URL.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        Self {
            href: url.as_str().to_string(),
            pathname: url.path().to_string(),
            search: prefixed('?', url.query()),
            hash: prefixed('#', url.fragment()),
        }
    }
}

impl fmt::Display for UrlSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href)
    }
}

fn prefixed(prefix: char, component: Option<&str>) -> String {
    component
        .filter(|c| !c.is_empty())
        .map(|c| format!("{prefix}{c}"))
        .unwrap_or_default()
}

/// The signal that observed a URL change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeSource {
    /// A wrapped `pushState`/`replaceState` call.
    #[serde(rename = "history-api")]
    HistoryApi,
    /// A native `popstate` notification.
    #[serde(rename = "popstate")]
    PopState,
    /// A native `hashchange` notification.
    #[serde(rename = "hashchange")]
    HashChange,
    /// The polling fallback (or an explicit resync).
    #[serde(rename = "poll")]
    Poll,
}

impl ChangeSource {
    /// Returns the wire name of this source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HistoryApi => "history-api",
            Self::PopState => "popstate",
            Self::HashChange => "hashchange",
            Self::Poll => "poll",
        }
    }
}

impl fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<NativeEvent> for ChangeSource {
    fn from(event: NativeEvent) -> Self {
        match event {
            NativeEvent::PopState => Self::PopState,
            NativeEvent::HashChange => Self::HashChange,
        }
    }
}

/// A detected URL change.
///
/// Only created when `current.href != previous.href`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlChangeEvent {
    /// The last known location before the change.
    pub previous: UrlSnapshot,
    /// The newly observed location.
    pub current: UrlSnapshot,
    /// The signal that observed the change first.
    pub source: ChangeSource,
    /// When the change was detected.
    #[serde(serialize_with = "unix_millis")]
    pub detected_at: SystemTime,
}

fn unix_millis<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    let millis = time
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
    serializer.serialize_u64(millis)
}
