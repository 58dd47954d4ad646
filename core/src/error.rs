//! Error taxonomy for the reservation lifecycle.
//!
//! Every variant except [`HoldError::Storage`] is a caller-facing, locally
//! detected condition: retrying the same request verbatim will fail again,
//! so the caller must re-query and retry with fresh input. `Storage` covers
//! transient database failures (lock timeout, connection loss) and is the
//! only retryable class.

use crate::types::{BookingId, BookingStatus, SeatId, ShowId};
use thiserror::Error;

/// Failures of the reservation and booking-lifecycle operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HoldError {
    /// No inventory ledger exists for the show
    #[error("show {0} not found")]
    ShowNotFound(ShowId),

    /// Aggregate capacity check failed at hold creation
    #[error("no capacity: requested {requested}, available {available}")]
    NoCapacity {
        /// Units the caller asked for
        requested: u32,
        /// Units that were available at check time
        available: u32,
    },

    /// A specifically requested seat is missing or not available
    #[error("seat {seat} is not available")]
    SeatUnavailable {
        /// The offending seat
        seat: SeatId,
    },

    /// The selection named no units at all
    #[error("selection is empty")]
    EmptySelection,

    /// No booking ledger row for that id
    #[error("booking {0} not found")]
    BookingNotFound(BookingId),

    /// Operation attempted on a booking not in the required status
    #[error("booking is {current}")]
    InvalidState {
        /// The booking's current status
        current: BookingStatus,
    },

    /// Confirm attempted after the hold deadline; the hold has been expired
    /// and its units released
    #[error("booking {0} expired")]
    BookingExpired(BookingId),

    /// Transient storage failure; the transaction was rolled back
    #[error("storage error: {0}")]
    Storage(String),
}

impl HoldError {
    /// Whether the caller may retry the same request after backoff.
    ///
    /// Only transient storage failures are retryable as-is; everything else
    /// requires fresh input (re-selected seats, a different booking).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_errors_are_retryable() {
        assert!(HoldError::Storage("connection reset".into()).is_retryable());
        assert!(!HoldError::ShowNotFound(ShowId::new()).is_retryable());
        assert!(
            !HoldError::NoCapacity {
                requested: 2,
                available: 1
            }
            .is_retryable()
        );
        assert!(
            !HoldError::InvalidState {
                current: BookingStatus::Confirmed
            }
            .is_retryable()
        );
    }

    #[test]
    fn invalid_state_names_the_current_status() {
        let err = HoldError::InvalidState {
            current: BookingStatus::Expired,
        };
        assert_eq!(err.to_string(), "booking is EXPIRED");
    }
}
