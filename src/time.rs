//! Time abstraction for testability.
//!
//! This module provides a [`Clock`] trait used to timestamp URL change
//! events, allowing tests to inject controlled time values.

use std::time::SystemTime;

/// Abstraction over system time for testability.
///
/// # Example
///
/// ```
/// use navwatch::time::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let now = clock.now();
/// assert!(now >= std::time::SystemTime::UNIX_EPOCH);
/// ```
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// Production clock delegating to [`SystemTime::now()`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    /// A mock clock returning controlled time values.
    struct MockClock {
        secs: Cell<u64>,
    }

    impl MockClock {
        const fn new(initial_secs: u64) -> Self {
            Self {
                secs: Cell::new(initial_secs),
            }
        }

        fn advance(&self, secs: u64) {
            self.secs.set(self.secs.get() + secs);
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH + Duration::from_secs(self.secs.get())
        }
    }

    #[test]
    fn system_clock_returns_current_time() {
        let clock = SystemClock;
        let before = SystemTime::now();
        let result = clock.now();
        let after = SystemTime::now();

        assert!(result >= before);
        assert!(result <= after);
    }

    #[test]
    fn mock_clock_can_advance() {
        let clock = MockClock::new(0);
        assert_eq!(clock.now(), SystemTime::UNIX_EPOCH);

        clock.advance(100);
        assert_eq!(
            clock.now(),
            SystemTime::UNIX_EPOCH + Duration::from_secs(100)
        );
    }
}
