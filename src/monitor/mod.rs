//! Monitor layer for detecting URL changes.
//!
//! This module provides types and functions for:
//! - Capturing locations ([`UrlSnapshot`]) and describing changes ([`UrlChangeEvent`], [`ChangeSource`])
//! - Selecting signal sources ([`MonitorOptions`])
//! - Watching a browsing context ([`UrlMonitor`], [`MonitorPhase`], [`ActiveSignals`])
//! - Consuming changes asynchronously ([`UrlChangeStream`])
//! - Error handling ([`MonitorError`], [`SignalAttachFailure`], [`SnapshotError`])

mod error;
mod options;
mod signals;
mod snapshot;
mod stream;
mod url_monitor;

pub use error::{MonitorError, SignalAttachFailure, SignalKind};
pub use options::MonitorOptions;
pub use snapshot::{ChangeSource, SnapshotError, UrlChangeEvent, UrlSnapshot};
pub use stream::UrlChangeStream;
pub use url_monitor::{ActiveSignals, MonitorPhase, URL_CHANGED, UrlMonitor};
