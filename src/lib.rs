//! navwatch: URL change monitor
//!
//! A library for detecting URL changes in a browsing context by combining
//! history method interception, native navigation events and a polling
//! fallback into one deduplicated event stream.
//!
//! - [`monitor`]: the [`UrlMonitor`](monitor::UrlMonitor) and its event types
//! - [`timer`]: one backing timer shared by many logical timers
//! - [`emitter`]: synchronous publish/subscribe with listener isolation
//! - [`browser`]: the host boundary and an in-memory window

pub mod browser;
pub mod config;
pub mod emitter;
pub mod id;
pub mod monitor;
pub mod time;
pub mod timer;
