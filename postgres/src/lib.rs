//! PostgreSQL storage for the Boxoffice reservation engine.
//!
//! This crate owns the two shared mutable resources of the system:
//!
//! - the **inventory store** (`show_inventory` counters plus the optional
//!   per-seat `seats` table) in [`inventory`] and [`seats`]
//! - the **booking ledger** (`bookings`) in [`bookings`]
//!
//! # Concurrency guard
//!
//! There is no in-process shared mutable state: all serialization happens
//! through PostgreSQL row locks, so the design is correct across multiple
//! independent server instances. Every mutating helper here runs inside a
//! caller-owned [`sqlx::Transaction`] and the first statement of each
//! logical operation takes `SELECT ... FOR UPDATE` on the rows it will
//! mutate. Seat rows are always locked in ascending seat id order to give
//! overlapping multi-seat requests a total lock order.
//!
//! Mutation helpers deliberately take a transaction rather than a pool:
//! the compiler then enforces that a check and its decrement commit as one
//! atomic unit. Read helpers take the pool and acquire no locks.

#![forbid(unsafe_code)]

pub mod bookings;
pub mod config;
pub mod inventory;
pub mod migrations;
pub mod seats;

pub use config::PostgresConfig;

use boxoffice_core::HoldError;

/// Maps a driver error to the retryable storage class.
///
/// Used by this crate and by the engine for transaction begin/commit.
#[must_use]
pub fn storage_err(err: sqlx::Error) -> HoldError {
    HoldError::Storage(err.to_string())
}

/// Narrowing conversion for unit counts headed into `INT` columns.
pub(crate) fn to_db_units(units: u32) -> i32 {
    i32::try_from(units).unwrap_or(i32::MAX)
}

/// Widening conversion for unit counts read back from `INT` columns.
///
/// Negative values cannot be produced by this crate's writes and are clamped
/// to zero rather than trusted.
pub(crate) fn from_db_units(units: i32) -> u32 {
    u32::try_from(units).unwrap_or(0)
}
