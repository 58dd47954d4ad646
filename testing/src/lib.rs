//! # Boxoffice Testing
//!
//! Testing utilities and mock implementations of the environment ports
//! defined in `boxoffice-core`.
//!
//! This crate provides:
//! - [`mocks::FixedClock`]: deterministic, immutable time
//! - [`mocks::MockClock`]: settable time for exercising deadlines
//! - [`mocks::RecordingScheduler`]: captures scheduled expiry triggers
//!
//! ## Example
//!
//! ```
//! use boxoffice_testing::mocks::MockClock;
//! use boxoffice_core::environment::Clock;
//! use chrono::{Duration, Utc};
//!
//! let clock = MockClock::new(Utc::now());
//! let before = clock.now();
//! clock.advance(Duration::minutes(3));
//! assert_eq!(clock.now(), before + Duration::minutes(3));
//! ```

/// Mock implementations of the environment ports.
pub mod mocks {
    use async_trait::async_trait;
    use boxoffice_core::environment::{Clock, ExpiryScheduler, ScheduleError};
    use boxoffice_core::types::BookingId;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::{Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
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

    /// Settable clock for exercising deadline behavior
    ///
    /// Starts at a given instant and only moves when the test says so, which
    /// lets a test create a hold "now" and then jump past its deadline.
    #[derive(Debug)]
    pub struct MockClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl MockClock {
        /// Create a new mock clock starting at the given time
        #[must_use]
        pub const fn new(start: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(start),
            }
        }

        /// Jump to an absolute time
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = time;
        }

        /// Move the clock forward (or backward, with a negative duration)
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// One captured call to [`ExpiryScheduler::schedule`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ScheduledExpiry {
        /// The booking the trigger was scheduled for
        pub booking_id: BookingId,
        /// The deadline the trigger should fire at
        pub deadline: DateTime<Utc>,
    }

    /// Scheduler that records every trigger instead of delivering it
    ///
    /// Accepts every call (or fails every call, when built with
    /// [`RecordingScheduler::failing`]) so tests can assert both that the
    /// engine schedules triggers and that scheduling failures never fail a
    /// hold.
    #[derive(Debug, Default)]
    pub struct RecordingScheduler {
        calls: Mutex<Vec<ScheduledExpiry>>,
        fail: bool,
    }

    impl RecordingScheduler {
        /// Scheduler that accepts and records every trigger
        #[must_use]
        pub const fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        /// Scheduler that records and then rejects every trigger
        #[must_use]
        pub const fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        /// Every trigger scheduled so far, in order
        #[must_use]
        pub fn scheduled(&self) -> Vec<ScheduledExpiry> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl ExpiryScheduler for RecordingScheduler {
        async fn schedule(
            &self,
            booking_id: BookingId,
            deadline: DateTime<Utc>,
        ) -> Result<(), ScheduleError> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(ScheduledExpiry {
                    booking_id,
                    deadline,
                });
            if self.fail {
                Err(ScheduleError::QueueFull)
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::mocks::{MockClock, RecordingScheduler};
    use boxoffice_core::environment::{Clock, ExpiryScheduler, ScheduleError};
    use boxoffice_core::types::BookingId;
    use chrono::{Duration, Utc};

    #[test]
    fn mock_clock_advances_on_demand() {
        let start = Utc::now();
        let clock = MockClock::new(start);
        assert_eq!(clock.now(), start);
        clock.advance(Duration::seconds(121));
        assert_eq!(clock.now(), start + Duration::seconds(121));
    }

    #[tokio::test]
    async fn recording_scheduler_captures_calls() {
        let scheduler = RecordingScheduler::new();
        let booking_id = BookingId::new();
        let deadline = Utc::now() + Duration::minutes(2);

        scheduler.schedule(booking_id, deadline).await.unwrap();

        let calls = scheduler.scheduled();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].booking_id, booking_id);
        assert_eq!(calls[0].deadline, deadline);
    }

    #[tokio::test]
    async fn failing_scheduler_still_records() {
        let scheduler = RecordingScheduler::failing();
        let result = scheduler.schedule(BookingId::new(), Utc::now()).await;
        assert_eq!(result, Err(ScheduleError::QueueFull));
        assert_eq!(scheduler.scheduled().len(), 1);
    }
}
