use jiff::Timestamp;

/// Source of "now" for record timestamps.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A manually driven clock for tests, available with the `test-util`
/// feature.
#[cfg(any(test, feature = "test-util"))]
pub mod test_clock {
    use super::Clock;
    use jiff::{SignedDuration, Timestamp};
    use std::sync::{Arc, Mutex, PoisonError};

    #[derive(Debug, Clone)]
    pub struct TestClock {
        inner: Arc<Mutex<Timestamp>>,
    }

    impl TestClock {
        pub fn new(now: Timestamp) -> Self {
            Self {
                inner: Arc::new(Mutex::new(now)),
            }
        }

        /// Moves the clock forward (or backward for negative durations).
        pub fn advance(&self, by: SignedDuration) {
            let mut now = self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *now = *now + by;
        }

        pub fn set(&self, to: Timestamp) {
            *self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Timestamp {
            *self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
        }
    }

    #[test]
    fn test_clock_works() {
        let base = Timestamp::from_second(0).unwrap();
        let clock = TestClock::new(base);
        assert_eq!(clock.now(), base);

        clock.advance(SignedDuration::from_secs(1000));
        assert_eq!(clock.now(), Timestamp::from_second(1000).unwrap());

        // the clock can be wound back to simulate clock skew
        clock.set(base);
        assert_eq!(clock.now(), base);
    }
}
