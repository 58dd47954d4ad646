//! # Boxoffice Core
//!
//! Domain types and ports for the Boxoffice reservation engine.
//!
//! This crate defines the vocabulary shared by every other crate in the
//! workspace:
//!
//! - **Identifiers and entities**: shows, seats, bookings, and the inventory
//!   ledger ([`types`])
//! - **Error taxonomy**: every caller-facing failure of the reservation
//!   lifecycle ([`error`])
//! - **Environment ports**: external dependencies (clock, expiry scheduler)
//!   abstracted behind traits and injected at construction ([`environment`])
//!
//! ## Booking lifecycle
//!
//! ```text
//! PENDING ──confirm (before deadline)──▶ CONFIRMED   (terminal)
//! PENDING ──confirm (after deadline)───▶ EXPIRED     (terminal)
//! PENDING ──trigger / sweep────────────▶ EXPIRED     (terminal)
//! ```
//!
//! `FAILED` is reserved for create-time failures surfaced to the caller
//! without a persisted row and for administrative cancellation. Terminal
//! states never transition again.
//!
//! This crate is intentionally free of I/O: storage lives in
//! `boxoffice-postgres` and orchestration in `boxoffice-engine`.

pub mod environment;
pub mod error;
pub mod types;

pub use error::HoldError;
pub use types::{
    Booking, BookingId, BookingStatus, Money, Seat, SeatId, SeatStatus, SeatTier, SeatingPlan,
    Selection, ShowId, ShowInventory, TierPrices, UserId,
};
