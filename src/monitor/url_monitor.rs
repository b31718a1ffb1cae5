//! URL change monitor.
//!
//! This module provides [`UrlMonitor`], which combines history interception,
//! native navigation events and a polling fallback into one deduplicated
//! `urlChanged` event stream.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::error::{MonitorError, SignalAttachFailure, SignalKind};
use super::options::MonitorOptions;
use super::signals::{Attachments, HistoryInterception};
use super::snapshot::{ChangeSource, UrlChangeEvent, UrlSnapshot};
use super::stream::UrlChangeStream;
use crate::browser::{BrowsingContext, EventTarget, NativeEvent};
use crate::emitter::{ErrorSink, EventEmitter, ListenerResult, SubscriptionId, TracingSink};
use crate::id::{IdGenerator, UuidGenerator};
use crate::time::{Clock, SystemClock};
use crate::timer::Scheduler;

/// Name of the event emitted for every detected URL change.
pub const URL_CHANGED: &str = "urlChanged";

/// Lifecycle phase of a [`UrlMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    /// Constructed, never started.
    Idle,
    /// Signals attached, changes are detected.
    Watching,
    /// Signals detached. `start()` resumes watching.
    Stopped,
}

/// Signal sources attached in the current watch session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSignals {
    /// `pushState`/`replaceState` are wrapped.
    pub history_api: bool,
    /// Native events with an attached handler.
    pub native_events: Vec<NativeEvent>,
    /// The poll fallback is scheduled.
    pub poll: bool,
}

struct State {
    phase: MonitorPhase,
    last_known: Option<UrlSnapshot>,
    attachments: Option<Attachments>,
}

struct Core {
    context: Rc<dyn BrowsingContext>,
    scheduler: Scheduler,
    options: MonitorOptions,
    clock: Box<dyn Clock>,
    emitter: Rc<EventEmitter<UrlChangeEvent>>,
    state: RefCell<State>,
}

impl Core {
    /// Compares the live location with the last known one and emits on change.
    ///
    /// Every signal funnels through here, so a change seen by several
    /// signals is emitted once, attributed to the first one.
    fn check_for_change(&self, source: ChangeSource) {
        if self.state.borrow().phase != MonitorPhase::Watching {
            tracing::trace!("Ignoring {source} check while not watching");
            return;
        }

        let Some(href) = self.context.location() else {
            tracing::trace!("Location unavailable during {source} check");
            return;
        };
        let current = match UrlSnapshot::parse(&href) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Skipping {source} check: {e}");
                return;
            }
        };
        let detected_at = self.clock.now();

        let event = {
            let mut state = self.state.borrow_mut();
            if state
                .last_known
                .as_ref()
                .is_some_and(|known| known.href == current.href)
            {
                tracing::trace!("No URL change on {source} check");
                return;
            }
            let Some(previous) = state.last_known.replace(current.clone()) else {
                return;
            };
            UrlChangeEvent {
                previous,
                current,
                source,
                detected_at,
            }
        };

        tracing::debug!(
            "URL changed via {source}: {} -> {}",
            event.previous,
            event.current
        );
        self.emitter.emit(URL_CHANGED, &event);
    }
}

/// Detects URL changes in a browsing context and emits `urlChanged`.
///
/// # Signal Sources
///
/// On [`start`](Self::start) the monitor attaches, as configured by
/// [`MonitorOptions`]:
/// 1. Wrappers over `pushState`/`replaceState` (wrap-and-delegate)
/// 2. Handlers for `popstate`/`hashchange`
/// 3. A recurring poll on the shared [`Scheduler`]
///
/// All of them trigger the same comparison against the last known href, so
/// one navigation yields exactly one event no matter how many signals see it.
///
/// # Degradation
///
/// A missing history object or event target is logged and skipped; the
/// monitor keeps watching with the remaining sources. Only a missing
/// location accessor makes `start()` fail.
///
/// # Re-entrancy
///
/// Listeners may navigate, read [`current`](Self::current), subscribe,
/// unsubscribe, or [`stop`](Self::stop) the monitor.
///
/// # Example
///
/// ```
/// use navwatch::browser::MemoryWindow;
/// use navwatch::monitor::{MonitorOptions, UrlMonitor};
/// use navwatch::timer::{ManualTimer, Scheduler};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let window = MemoryWindow::new("https://a.test/").unwrap();
/// let scheduler = Scheduler::new(ManualTimer::new());
/// let monitor = UrlMonitor::new(window.clone(), scheduler, MonitorOptions::default());
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
/// monitor.on_url_changed(move |event| {
///     sink.borrow_mut().push(event.current.pathname.clone());
///     Ok(())
/// });
///
/// monitor.start().unwrap();
/// window.push("/b").unwrap();
/// assert_eq!(*seen.borrow(), vec!["/b"]);
/// ```
pub struct UrlMonitor {
    core: Rc<Core>,
}

impl UrlMonitor {
    /// Creates an idle monitor with the system clock, UUID subscription ids
    /// and listener failures logged via `tracing`.
    #[must_use]
    pub fn new(
        context: impl BrowsingContext + 'static,
        scheduler: Scheduler,
        options: MonitorOptions,
    ) -> Self {
        Self::with_parts(
            context,
            scheduler,
            options,
            SystemClock,
            UuidGenerator,
            Rc::new(TracingSink),
        )
    }

    /// Creates an idle monitor with every collaborator injected.
    ///
    /// This constructor allows injecting a mock clock, deterministic ids and
    /// a collecting error sink for testing.
    #[must_use]
    pub fn with_parts(
        context: impl BrowsingContext + 'static,
        scheduler: Scheduler,
        options: MonitorOptions,
        clock: impl Clock + 'static,
        ids: impl IdGenerator + 'static,
        sink: Rc<dyn ErrorSink>,
    ) -> Self {
        Self {
            core: Rc::new(Core {
                context: Rc::new(context),
                scheduler,
                options,
                clock: Box::new(clock),
                emitter: Rc::new(EventEmitter::with_parts(ids, sink)),
                state: RefCell::new(State {
                    phase: MonitorPhase::Idle,
                    last_known: None,
                    attachments: None,
                }),
            }),
        }
    }

    /// Starts watching.
    ///
    /// Captures the current location without emitting, then attaches every
    /// configured signal source. Calling it while already watching does
    /// nothing.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::UnsupportedEnvironment`] if the location cannot be read
    /// - [`MonitorError::InvalidLocation`] if the location is not an absolute URL
    /// - [`MonitorError::Schedule`] if the poll interval is rejected
    ///
    /// On error nothing stays attached and the phase is unchanged.
    pub fn start(&self) -> Result<(), MonitorError> {
        if self.phase() == MonitorPhase::Watching {
            tracing::debug!("URL monitor already watching");
            return Ok(());
        }

        let href = self
            .core
            .context
            .location()
            .ok_or(MonitorError::UnsupportedEnvironment)?;
        let initial = UrlSnapshot::parse(&href)?;
        let attachments = self.attach()?;

        let mut state = self.core.state.borrow_mut();
        tracing::info!(
            "URL monitor watching {initial} (history: {}, events: {:?}, poll: {})",
            attachments.history.is_some(),
            attachments.events(),
            attachments.poll.is_some()
        );
        state.last_known = Some(initial);
        state.attachments = Some(attachments);
        state.phase = MonitorPhase::Watching;
        Ok(())
    }

    /// Stops watching and detaches every signal source.
    ///
    /// Idempotent, and safe to call from inside a `urlChanged` listener.
    pub fn stop(&self) {
        let attachments = {
            let mut state = self.core.state.borrow_mut();
            if state.phase != MonitorPhase::Watching {
                return;
            }
            state.phase = MonitorPhase::Stopped;
            state.attachments.take()
        };

        if let Some(attachments) = attachments {
            attachments.release(&self.core.scheduler);
        }
        tracing::info!("URL monitor stopped");
    }

    /// Subscribes to `urlChanged`.
    pub fn on_url_changed(
        &self,
        callback: impl Fn(&UrlChangeEvent) -> ListenerResult + 'static,
    ) -> SubscriptionId {
        self.core.emitter.on(URL_CHANGED, callback)
    }

    /// Removes a `urlChanged` subscription. Returns true if it was present.
    pub fn off_url_changed(&self, id: &SubscriptionId) -> bool {
        self.core.emitter.off(id)
    }

    /// Returns the number of `urlChanged` subscriptions.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.core.emitter.listener_count(URL_CHANGED)
    }

    /// Returns a stream of changes, unsubscribed when dropped.
    ///
    /// The stream ends once the monitor is dropped.
    #[must_use]
    pub fn changes(&self) -> UrlChangeStream {
        UrlChangeStream::subscribe(&self.core.emitter)
    }

    /// Returns the last known location.
    ///
    /// `None` until the first successful `start()`.
    #[must_use]
    pub fn current(&self) -> Option<UrlSnapshot> {
        self.core.state.borrow().last_known.clone()
    }

    /// Returns the lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> MonitorPhase {
        self.core.state.borrow().phase
    }

    /// Returns the signal sources attached in the current watch session.
    #[must_use]
    pub fn active_signals(&self) -> ActiveSignals {
        self.core
            .state
            .borrow()
            .attachments
            .as_ref()
            .map(|a| ActiveSignals {
                history_api: a.history.is_some(),
                native_events: a.events(),
                poll: a.poll.is_some(),
            })
            .unwrap_or_default()
    }

    /// Runs a check immediately, attributed to [`ChangeSource::Poll`].
    pub fn check_now(&self) {
        self.core.check_for_change(ChangeSource::Poll);
    }

    fn attach(&self) -> Result<Attachments, MonitorError> {
        let core = &self.core;
        let mut attachments = Attachments::default();

        if core.options.intercept_history {
            match core.context.history() {
                Some(history) => {
                    let weak = Rc::downgrade(core);
                    attachments.history = Some(HistoryInterception::install(
                        history,
                        Rc::new(move |kind| {
                            tracing::trace!("{kind} intercepted");
                            check(&weak, ChangeSource::HistoryApi);
                        }),
                    ));
                }
                None => skip(SignalKind::HistoryApi, "no history object"),
            }
        }

        let events = core.options.distinct_events();
        if !events.is_empty() {
            match core.context.events() {
                Some(target) => attachments.listeners = attach_events(core, &*target, events),
                None => skip(SignalKind::NativeEvents, "no event target"),
            }
        }

        if let Some(interval) = core.options.poll_interval {
            let weak = Rc::downgrade(core);
            match core
                .scheduler
                .schedule(interval, move || check(&weak, ChangeSource::Poll))
            {
                Ok(handle) => attachments.poll = Some(handle),
                Err(e) => {
                    attachments.release(&core.scheduler);
                    return Err(e.into());
                }
            }
        }

        Ok(attachments)
    }
}

impl Drop for UrlMonitor {
    fn drop(&mut self) {
        self.stop();
        self.core.emitter.dispose();
    }
}

impl fmt::Debug for UrlMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.core.state.borrow();
        f.debug_struct("UrlMonitor")
            .field("phase", &state.phase)
            .field("last_known", &state.last_known)
            .field("options", &self.core.options)
            .finish_non_exhaustive()
    }
}

fn attach_events(
    core: &Rc<Core>,
    target: &dyn EventTarget,
    events: Vec<NativeEvent>,
) -> Vec<(NativeEvent, crate::browser::DetachFn)> {
    events
        .into_iter()
        .map(|event| {
            let weak = Rc::downgrade(core);
            let detach = target.attach(
                event,
                Rc::new(move || check(&weak, ChangeSource::from(event))),
            );
            (event, detach)
        })
        .collect()
}

fn check(core: &Weak<Core>, source: ChangeSource) {
    if let Some(core) = core.upgrade() {
        core.check_for_change(source);
    }
}

fn skip(signal: SignalKind, reason: &'static str) {
    tracing::warn!("{}", SignalAttachFailure { signal, reason });
}

#[cfg(test)]
#[path = "url_monitor_tests.rs"]
mod tests;
