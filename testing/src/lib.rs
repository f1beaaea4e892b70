//! # EventHub Testing
//!
//! Testing utilities and helpers for EventHub features.
//!
//! - Deterministic [`Clock`] implementations
//! - [`ReducerTest`], a Given/When/Then harness for reducers
//! - Effect assertion helpers
//! - A one-call tracing subscriber for tests that want log output
//!
//! ## Example
//!
//! ```ignore
//! use eventhub_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(TicketIssuerReducer::new())
//!     .with_env(test_environment())
//!     .given_state(TicketIssuerState::default())
//!     .when_action(TicketIssuerAction::Close)
//!     .then_state(|state| assert!(state.is_closed()))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use eventhub_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use eventhub_testing::mocks::FixedClock;
    /// use eventhub_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2024-12-28 18:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::from_timestamp(1_735_408_800, 0).unwrap_or_default(),
        )
    }
}

/// Install a compact tracing subscriber honouring `RUST_LOG`.
///
/// Safe to call from many tests; only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
