//! Backing timer implementations.
//!
//! A [`TimerBackend`] is the one platform timer a [`super::Scheduler`] owns.
//! The scheduler arms it with a period and a tick callback while at least one
//! logical timer is active, and disarms it when the last one goes away.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Callback a backend invokes once per elapsed period.
pub type TickFn = Rc<dyn Fn()>;

/// The single underlying timer driving a scheduler.
///
/// # Contract
///
/// - `arm` replaces any previous arming. The first tick comes after `first`,
///   then `tick` is invoked once per `period` until `disarm` or the next `arm`.
/// - Implementations must not invoke `tick` synchronously from `arm`.
/// - `since_last_tick` measures from the last tick, or from one `period`
///   before the first tick while that is still pending.
pub trait TimerBackend {
    /// Starts (or restarts) the periodic tick.
    fn arm(&mut self, period: Duration, first: Duration, tick: TickFn);

    /// Stops the periodic tick. Idempotent.
    fn disarm(&mut self);

    /// Time elapsed on the current tick grid; zero while disarmed.
    fn since_last_tick(&self) -> Duration;
}

#[derive(Default)]
struct ManualState {
    armed: Option<(Duration, TickFn)>,
    until_next: Duration,
    since_tick: Duration,
    arm_count: usize,
}

/// Host-driven backend: ticks happen only when [`ManualTimer::fire`] is called
/// or simulated time passes via [`ManualTimer::advance`].
///
/// Clones share state, so a test can keep one clone to drive the timer
/// after handing another to the scheduler.
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Rc<RefCell<ManualState>>,
}

impl ManualTimer {
    /// Creates an unarmed manual timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers one tick if armed. Returns whether a tick was delivered.
    ///
    /// The simulated clock restarts from this tick.
    pub fn fire(&self) -> bool {
        let tick = {
            let mut state = self.state.borrow_mut();
            let Some((period, tick)) = state.armed.as_ref().map(|(p, t)| (*p, Rc::clone(t)))
            else {
                return false;
            };
            state.until_next = period;
            state.since_tick = Duration::ZERO;
            tick
        };

        tick();
        true
    }

    /// Simulates `elapsed` wall time, delivering every tick that comes due.
    ///
    /// Progress towards the next tick carries over between calls, and the
    /// schedule is re-read after every tick since callbacks may cause the
    /// scheduler to re-arm. Returns the number of ticks delivered.
    pub fn advance(&self, elapsed: Duration) -> usize {
        let mut left = elapsed;
        let mut delivered = 0;

        loop {
            let until_next = {
                let mut state = self.state.borrow_mut();
                match state.armed.as_ref() {
                    Some((period, _)) if !period.is_zero() => {}
                    _ => break,
                }
                if left < state.until_next {
                    state.until_next -= left;
                    state.since_tick += left;
                    break;
                }
                state.until_next
            };

            left -= until_next;
            self.fire();
            delivered += 1;
        }

        delivered
    }

    /// Returns the armed period, if armed.
    #[must_use]
    pub fn period(&self) -> Option<Duration> {
        self.state.borrow().armed.as_ref().map(|(period, _)| *period)
    }

    /// Returns the simulated time left until the next tick, if armed.
    #[must_use]
    pub fn next_tick_in(&self) -> Option<Duration> {
        let state = self.state.borrow();
        state.armed.as_ref().map(|_| state.until_next)
    }

    /// Returns true if the timer is currently armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state.borrow().armed.is_some()
    }

    /// Returns how many times the timer has been armed.
    #[must_use]
    pub fn arm_count(&self) -> usize {
        self.state.borrow().arm_count
    }
}

impl TimerBackend for ManualTimer {
    fn arm(&mut self, period: Duration, first: Duration, tick: TickFn) {
        let mut state = self.state.borrow_mut();
        state.armed = Some((period, tick));
        state.until_next = first;
        state.since_tick = period.saturating_sub(first);
        state.arm_count += 1;
    }

    fn disarm(&mut self) {
        let mut state = self.state.borrow_mut();
        state.armed = None;
        state.since_tick = Duration::ZERO;
    }

    fn since_last_tick(&self) -> Duration {
        self.state.borrow().since_tick
    }
}

impl fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTimer")
            .field("period", &self.period())
            .field("next_tick_in", &self.next_tick_in())
            .field("arm_count", &self.arm_count())
            .finish()
    }
}

/// Backend driven by a `tokio::time::interval` on a local task.
///
/// Arming spawns the ticking task with [`tokio::task::spawn_local`], so it
/// must be armed from within a [`tokio::task::LocalSet`].
#[derive(Debug)]
pub struct TokioTimer {
    task: Option<JoinHandle<()>>,
    last_tick: Rc<Cell<Instant>>,
}

impl TokioTimer {
    /// Creates an unarmed tokio timer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            task: None,
            last_tick: Rc::new(Cell::new(Instant::now())),
        }
    }

    /// Returns true if a ticking task is running.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.task.is_some()
    }
}

impl Default for TokioTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerBackend for TokioTimer {
    fn arm(&mut self, period: Duration, first: Duration, tick: TickFn) {
        self.disarm();

        let now = Instant::now();
        let start = now + first;
        self.last_tick.set(start.checked_sub(period).unwrap_or(now));

        let last_tick = Rc::clone(&self.last_tick);
        self.task = Some(tokio::task::spawn_local(async move {
            let mut interval = interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                last_tick.set(Instant::now());
                tick();
            }
        }));
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn since_last_tick(&self) -> Duration {
        if self.task.is_none() {
            return Duration::ZERO;
        }
        Instant::now().saturating_duration_since(self.last_tick.get())
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
