//! Signal source selection for the URL monitor.

use std::time::Duration;

use crate::browser::NativeEvent;
use crate::config::defaults;

/// Which signal sources the monitor attaches on `start()`.
///
/// The defaults attach everything: history interception, both native
/// events, and polling at [`defaults::poll_interval`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Poll fallback interval; `None` disables polling.
    pub poll_interval: Option<Duration>,
    /// Native events to subscribe to. Duplicates are ignored.
    pub native_events: Vec<NativeEvent>,
    /// Whether to wrap `pushState`/`replaceState`.
    pub intercept_history: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Some(defaults::poll_interval()),
            native_events: NativeEvent::ALL.to_vec(),
            intercept_history: true,
        }
    }
}

impl MonitorOptions {
    /// Sets the poll fallback interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Disables the poll fallback.
    #[must_use]
    pub const fn without_polling(mut self) -> Self {
        self.poll_interval = None;
        self
    }

    /// Replaces the native event set, dropping duplicates.
    #[must_use]
    pub fn with_native_events(mut self, events: impl IntoIterator<Item = NativeEvent>) -> Self {
        self.native_events = dedup(events);
        self
    }

    /// Disables history method interception.
    #[must_use]
    pub const fn without_history_interception(mut self) -> Self {
        self.intercept_history = false;
        self
    }

    /// Returns the native events to attach, first occurrence wins.
    #[must_use]
    pub fn distinct_events(&self) -> Vec<NativeEvent> {
        dedup(self.native_events.iter().copied())
    }
}

fn dedup(events: impl IntoIterator<Item = NativeEvent>) -> Vec<NativeEvent> {
    let mut distinct = Vec::new();
    for event in events {
        if !distinct.contains(&event) {
            distinct.push(event);
        }
    }
    distinct
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_attaches_everything() {
        let options = MonitorOptions::default();

        assert_eq!(options.poll_interval, Some(Duration::from_secs(1)));
        assert_eq!(
            options.native_events,
            vec![NativeEvent::PopState, NativeEvent::HashChange]
        );
        assert!(options.intercept_history);
    }

    #[test]
    fn builders_override_defaults() {
        let options = MonitorOptions::default()
            .with_poll_interval(Duration::from_millis(250))
            .with_native_events([NativeEvent::HashChange])
            .without_history_interception();

        assert_eq!(options.poll_interval, Some(Duration::from_millis(250)));
        assert_eq!(options.native_events, vec![NativeEvent::HashChange]);
        assert!(!options.intercept_history);
    }

    #[test]
    fn without_polling_clears_interval() {
        let options = MonitorOptions::default().without_polling();
        assert!(options.poll_interval.is_none());
    }

    #[test]
    fn duplicate_events_are_dropped() {
        let options = MonitorOptions::default().with_native_events([
            NativeEvent::HashChange,
            NativeEvent::PopState,
            NativeEvent::HashChange,
        ]);

        assert_eq!(
            options.native_events,
            vec![NativeEvent::HashChange, NativeEvent::PopState]
        );
    }

    #[test]
    fn distinct_events_dedups_public_field() {
        let options = MonitorOptions {
            native_events: vec![NativeEvent::PopState, NativeEvent::PopState],
            ..MonitorOptions::default()
        };

        assert_eq!(options.distinct_events(), vec![NativeEvent::PopState]);
    }
}
