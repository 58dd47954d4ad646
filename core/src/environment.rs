//! Environment ports: external dependencies abstracted behind traits.
//!
//! The engine receives its infrastructure explicitly at construction instead
//! of reaching for globals. Two ports exist:
//!
//! - [`Clock`]: time source, so expiry logic is deterministic under test
//! - [`ExpiryScheduler`]: best-effort delayed trigger for hold expiry; the
//!   periodic sweep is the correctness backstop, so scheduling failures are
//!   logged by the caller, never fatal

use crate::types::BookingId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Clock trait - abstracts time operations for testability
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Failure to enqueue an expiry trigger.
///
/// Never rolls back the booking it was scheduled for; the sweep compensates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The trigger queue is full
    #[error("expiry queue is full")]
    QueueFull,
    /// The trigger queue has shut down
    #[error("expiry queue is closed")]
    Closed,
}

/// Delayed-trigger port for hold expiry.
///
/// Implementations deliver at-least-once at best effort: duplicate delivery
/// and total loss are both tolerated because the expire operation is
/// idempotent and the sweep re-discovers lapsed holds.
#[async_trait]
pub trait ExpiryScheduler: Send + Sync {
    /// Schedule an expiry trigger for `booking_id` at `deadline`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] when the trigger cannot be enqueued. The
    /// caller logs and swallows this; it must not fail the hold.
    async fn schedule(&self, booking_id: BookingId, deadline: DateTime<Utc>)
    -> Result<(), ScheduleError>;
}
