//! Shared timer scheduling.
//!
//! This module provides:
//! - [`Scheduler`]: multiplexes logical recurring/one-shot timers onto one backing timer
//! - [`TimerHandle`]: opaque handle identifying one logical timer
//! - [`TimerBackend`]: the single platform timer driving a scheduler
//! - [`ManualTimer`] / [`TokioTimer`]: host-driven and tokio-driven backends
//! - Error handling ([`ScheduleError`])

mod backend;
mod error;
mod scheduler;

pub use backend::{ManualTimer, TickFn, TimerBackend, TokioTimer};
pub use error::ScheduleError;
pub use scheduler::{DEFAULT_RESOLUTION, Scheduler, TimerCallback, TimerHandle};
