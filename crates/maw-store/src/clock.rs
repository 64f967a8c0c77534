//! Wall clock abstraction for mocking time in tests.
//!
//! - `SystemClock`: delegates to `chrono::Utc::now()`
//! - `MockClock`: returns a controllable timestamp

use chrono::{DateTime, Utc};

/// Source of wall-clock timestamps.
/// Implement this trait to control time in tests.
pub trait WallClock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Live implementation: delegates to the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use mock::MockClock;

#[cfg(any(test, feature = "test-support"))]
mod mock {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, Utc};

    use super::WallClock;

    /// Mock clock for unit tests.
    /// `now()` returns a fixed timestamp that moves only when you call
    /// `advance()` or `set()`. Clones share the same time.
    #[derive(Clone)]
    pub struct MockClock {
        current: Arc<Mutex<DateTime<Utc>>>,
    }

    impl MockClock {
        /// Create a mock clock fixed at `Utc::now()` at construction time.
        pub fn new() -> Self {
            Self::at(Utc::now())
        }

        pub fn at(time: DateTime<Utc>) -> Self {
            Self {
                current: Arc::new(Mutex::new(time)),
            }
        }

        /// Advance the mock clock by `duration`.
        pub fn advance(&self, duration: Duration) {
            *self.current.lock().unwrap() += duration;
        }

        pub fn set(&self, time: DateTime<Utc>) {
            *self.current.lock().unwrap() = time;
        }
    }

    impl Default for MockClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WallClock for MockClock {
        fn now(&self) -> DateTime<Utc> {
            *self.current.lock().unwrap()
        }
    }
}
