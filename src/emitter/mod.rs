//! Synchronous publish/subscribe capability.
//!
//! This module provides:
//! - [`EventEmitter`]: named events, ordered synchronous dispatch, per-listener isolation
//! - [`SubscriptionId`]: opaque handle returned on registration
//! - Error reporting ([`ErrorSink`], [`TracingSink`], [`CollectingSink`])
//! - Error types ([`ListenerError`], [`ListenerFailure`])

mod emitter;
mod error;
mod sink;

pub use emitter::{EventEmitter, Listener, ListenerResult, SubscriptionId};
pub use error::{ListenerError, ListenerFailure};
pub use sink::{CollectingSink, ErrorSink, TracingSink};
