//! Timer scheduler multiplexing logical timers onto one backend.
//!
//! Every active entry keeps a countdown in milliseconds, measured from the
//! last backend tick. The backend ticks at the greatest common divisor of all
//! periods and countdowns, so each entry comes due exactly on a tick and
//! entries due on the same tick run in registration order.
//!
//! New deadlines are snapped onto that tick grid: recurring timers round
//! down so they never fire later than their interval, one-shots round up so
//! they never fire before their delay. When the grid gets finer the backend is
//! re-armed so that its first tick lands on the old grid, which keeps every
//! existing deadline in place.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use super::backend::{TickFn, TimerBackend};
use super::error::ScheduleError;
use crate::id::{IdGenerator, UuidGenerator};

/// Default quantization step for requested periods.
pub const DEFAULT_RESOLUTION: Duration = Duration::from_millis(10);

/// Callback invoked when a timer comes due.
pub type TimerCallback = Rc<dyn Fn()>;

/// Opaque handle for one logical timer.
///
/// Owned by the requester and used only to cancel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerHandle(String);

impl TimerHandle {
    /// Returns the underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Every,
    Once,
}

impl EntryKind {
    /// Places a deadline on a grid of `step` milliseconds.
    const fn snap(self, deadline_ms: u64, step: u64) -> u64 {
        match self {
            Self::Every => deadline_ms / step * step,
            Self::Once => deadline_ms.div_ceil(step) * step,
        }
    }
}

struct Entry {
    handle: TimerHandle,
    kind: EntryKind,
    period_ms: u64,
    remaining_ms: u64,
    /// Not yet placed on the tick grid.
    pending: bool,
    callback: TimerCallback,
}

/// What the backend must do after the active set changed.
enum Arming {
    Off,
    On { period_ms: u64, first: Duration },
}

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
    /// Period the backend is armed with, `None` while disarmed.
    tick_ms: Option<u64>,
}

struct Shared {
    inner: RefCell<Inner>,
    backend: RefCell<Box<dyn TimerBackend>>,
    ids: Box<dyn IdGenerator>,
    resolution_ms: u64,
}

/// Cooperative scheduler sharing one backing timer among all consumers.
///
/// Cloning yields another handle to the same scheduler. Consumers only ever
/// see [`TimerHandle`]s; the backend is touched exclusively by the scheduler,
/// so one consumer's teardown cannot disturb another's timer.
///
/// # Backing timer lifecycle
///
/// - Armed lazily by the first `schedule`/`delay`
/// - While armed, its period only ever shrinks (to stay a divisor of every
///   active countdown)
/// - Re-arming keeps the phase of the previous tick grid, so scheduling a
///   short timer never delays a long one already running
/// - Disarmed as soon as the active set becomes empty
///
/// # Example
///
/// ```
/// use navwatch::timer::{ManualTimer, Scheduler};
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// let timer = ManualTimer::new();
/// let scheduler = Scheduler::new(timer.clone());
///
/// let hits = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&hits);
/// let handle = scheduler
///     .schedule(Duration::from_millis(100), move || counter.set(counter.get() + 1))
///     .unwrap();
///
/// timer.advance(Duration::from_millis(300));
/// assert_eq!(hits.get(), 3);
///
/// scheduler.cancel(&handle);
/// assert!(!timer.is_armed());
/// ```
#[derive(Clone)]
pub struct Scheduler {
    shared: Rc<Shared>,
}

impl Scheduler {
    /// Creates a scheduler with the default resolution and UUID handles.
    #[must_use]
    pub fn new(backend: impl TimerBackend + 'static) -> Self {
        Self::with_parts(backend, DEFAULT_RESOLUTION, UuidGenerator)
    }

    /// Creates a scheduler with a custom resolution.
    ///
    /// Requested periods are rounded down to a multiple of `resolution`, so a
    /// callback never fires later than asked. Periods shorter than one step
    /// are kept exact.
    #[must_use]
    pub fn with_resolution(backend: impl TimerBackend + 'static, resolution: Duration) -> Self {
        Self::with_parts(backend, resolution, UuidGenerator)
    }

    /// Creates a scheduler with every collaborator injected.
    #[must_use]
    pub fn with_parts(
        backend: impl TimerBackend + 'static,
        resolution: Duration,
        ids: impl IdGenerator + 'static,
    ) -> Self {
        let resolution_ms = u64::try_from(resolution.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);

        Self {
            shared: Rc::new(Shared {
                inner: RefCell::new(Inner::default()),
                backend: RefCell::new(Box::new(backend)),
                ids: Box::new(ids),
                resolution_ms,
            }),
        }
    }

    /// Registers a recurring callback firing at least once per `interval`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidInterval`] if `interval` is under 1ms.
    pub fn schedule(
        &self,
        interval: Duration,
        callback: impl Fn() + 'static,
    ) -> Result<TimerHandle, ScheduleError> {
        self.insert(EntryKind::Every, interval, Rc::new(callback))
    }

    /// Registers a one-shot callback firing once after `delay`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidInterval`] if `delay` is under 1ms.
    pub fn delay(
        &self,
        delay: Duration,
        callback: impl Fn() + 'static,
    ) -> Result<TimerHandle, ScheduleError> {
        self.insert(EntryKind::Once, delay, Rc::new(callback))
    }

    /// Cancels a timer. Unknown or already-cancelled handles are a no-op.
    ///
    /// Returns true if an active timer was removed.
    pub fn cancel(&self, handle: &TimerHandle) -> bool {
        let removed = {
            let mut inner = self.shared.inner.borrow_mut();
            let before = inner.entries.len();
            inner.entries.retain(|e| &e.handle != handle);
            inner.entries.len() != before
        };

        if removed {
            tracing::debug!("Cancelled timer {handle}");
            self.reconcile_backend();
        }
        removed
    }

    /// Cancels every timer and disarms the backing timer.
    pub fn cancel_all(&self) {
        let cleared = {
            let mut inner = self.shared.inner.borrow_mut();
            std::mem::take(&mut inner.entries).len()
        };

        tracing::debug!("Cancelled all {cleared} timer(s)");
        self.reconcile_backend();
    }

    /// Returns true if `handle` refers to an active timer.
    #[must_use]
    pub fn is_active(&self, handle: &TimerHandle) -> bool {
        self.shared
            .inner
            .borrow()
            .entries
            .iter()
            .any(|e| &e.handle == handle)
    }

    /// Returns the number of active timers.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.shared.inner.borrow().entries.len()
    }

    /// Returns true if the backing timer is armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.shared.inner.borrow().tick_ms.is_some()
    }

    /// Returns the period the backing timer is armed with.
    #[must_use]
    pub fn tick_period(&self) -> Option<Duration> {
        self.shared
            .inner
            .borrow()
            .tick_ms
            .map(Duration::from_millis)
    }

    fn insert(
        &self,
        kind: EntryKind,
        requested: Duration,
        callback: TimerCallback,
    ) -> Result<TimerHandle, ScheduleError> {
        let period_ms = self.quantize(requested)?;
        let handle = TimerHandle(self.shared.ids.new_id());

        self.shared.inner.borrow_mut().entries.push(Entry {
            handle: handle.clone(),
            kind,
            period_ms,
            remaining_ms: period_ms,
            pending: true,
            callback,
        });

        tracing::debug!("Scheduled {kind:?} timer {handle} at {period_ms}ms");
        self.reconcile_backend();
        Ok(handle)
    }

    fn quantize(&self, requested: Duration) -> Result<u64, ScheduleError> {
        let ms = u64::try_from(requested.as_millis()).unwrap_or(u64::MAX);
        if ms == 0 {
            return Err(ScheduleError::InvalidInterval { requested });
        }

        let step = self.shared.resolution_ms;
        if ms < step {
            return Ok(ms);
        }
        Ok(ms / step * step)
    }

    /// Brings the backend in line with the active set.
    fn reconcile_backend(&self) {
        let since_tick = self.shared.backend.borrow().since_last_tick();
        let change = self.shared.inner.borrow_mut().plan(since_tick);

        match change {
            None => {}
            Some(Arming::Off) => {
                tracing::debug!("No active timers, disarming backing timer");
                self.shared.backend.borrow_mut().disarm();
            }
            Some(Arming::On { period_ms, first }) => {
                tracing::debug!("Arming backing timer at {period_ms}ms, first tick in {first:?}");
                let tick = self.tick_fn();
                self.shared
                    .backend
                    .borrow_mut()
                    .arm(Duration::from_millis(period_ms), first, tick);
            }
        }
    }

    fn tick_fn(&self) -> TickFn {
        let weak: Weak<Shared> = Rc::downgrade(&self.shared);
        Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                Self { shared }.fire();
            }
        })
    }

    /// Handles one backend tick.
    fn fire(&self) {
        let due: Vec<(TimerHandle, TimerCallback)> = {
            let mut inner = self.shared.inner.borrow_mut();
            let Some(tick) = inner.tick_ms else {
                return;
            };

            inner
                .entries
                .iter_mut()
                .filter_map(|e| {
                    e.remaining_ms = e.remaining_ms.saturating_sub(tick);
                    (e.remaining_ms == 0).then(|| {
                        e.remaining_ms = e.period_ms;
                        (e.handle.clone(), Rc::clone(&e.callback))
                    })
                })
                .collect()
        };

        for (handle, callback) in due {
            // An earlier callback in this tick may have cancelled it
            let kind = {
                let inner = self.shared.inner.borrow();
                let Some(entry) = inner.entries.iter().find(|e| e.handle == handle) else {
                    continue;
                };
                entry.kind
            };

            if kind == EntryKind::Once {
                self.shared
                    .inner
                    .borrow_mut()
                    .entries
                    .retain(|e| e.handle != handle);
            }

            tracing::trace!("Timer {handle} due");
            callback();
        }

        self.reconcile_backend();
    }
}

impl Inner {
    /// Places pending entries on the tick grid and decides whether the
    /// backend must change. `since_tick` is the time elapsed on the current
    /// grid.
    fn plan(&mut self, since_tick: Duration) -> Option<Arming> {
        if self.entries.is_empty() {
            return self.tick_ms.take().map(|_| Arming::Off);
        }

        let step = self.entries.iter().fold(self.tick_ms.unwrap_or(0), |acc, e| {
            let acc = gcd(acc, e.period_ms);
            if e.pending {
                acc
            } else {
                gcd(acc, e.remaining_ms)
            }
        });

        let elapsed_ms = if self.tick_ms.is_some() {
            u64::try_from(since_tick.as_millis()).unwrap_or(u64::MAX)
        } else {
            0
        };

        for entry in self.entries.iter_mut().filter(|e| e.pending) {
            let deadline = elapsed_ms.saturating_add(entry.period_ms);
            entry.remaining_ms = entry.kind.snap(deadline, step).max(step);
            entry.pending = false;
        }

        if self.tick_ms == Some(step) {
            return None;
        }

        // The first tick of the new arming is the next grid point after now
        let passed_ms = elapsed_ms / step * step;
        for entry in &mut self.entries {
            entry.remaining_ms = entry.remaining_ms.saturating_sub(passed_ms).max(step);
        }

        let first = if self.tick_ms.is_some() {
            Duration::from_millis(passed_ms.saturating_add(step)).saturating_sub(since_tick)
        } else {
            Duration::from_millis(step)
        };

        self.tick_ms = Some(step);
        Some(Arming::On {
            period_ms: step,
            first,
        })
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("active", &self.active_count())
            .field("tick_period", &self.tick_period())
            .field("resolution_ms", &self.shared.resolution_ms)
            .finish_non_exhaustive()
    }
}

const fn gcd(a: u64, b: u64) -> u64 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
