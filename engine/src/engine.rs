//! The reservation engine: hold creation, confirmation, and expiry.
//!
//! Every operation is one database transaction with the same shape:
//! acquire a `FOR UPDATE` row lock, check, mutate, commit. The lock scope is
//! as narrow as possible (one inventory row plus, in granular mode, the
//! selected seat rows; or one booking row), so callers can treat each
//! operation as a bounded-latency synchronous call.
//!
//! The core guarantee is the check-and-decrement contract of the inventory
//! ledger: once a hold commits, the capacity reduction is visible to every
//! subsequent lock-acquiring operation on that show. There is no phantom
//! availability window.

use crate::config::ReservationConfig;
use boxoffice_core::environment::{Clock, ExpiryScheduler};
use boxoffice_core::types::{
    Booking, BookingId, BookingStatus, Seat, SeatId, SeatStatus, Selection, ShowId, ShowInventory,
    UserId,
};
use boxoffice_core::HoldError;
use boxoffice_postgres::{bookings, inventory, seats, storage_err};
use chrono::Duration;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Orchestrates the booking lifecycle against the inventory store and
/// booking ledger.
///
/// Cheap to clone behind an [`Arc`]; all state lives in the database, so any
/// number of engine instances (in any number of processes) stay correct
/// without extra coordination.
pub struct ReservationEngine {
    pool: PgPool,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn ExpiryScheduler>,
    hold_duration: Duration,
}

impl ReservationEngine {
    /// Creates a new engine over an already-connected pool.
    #[must_use]
    pub fn new(
        pool: PgPool,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn ExpiryScheduler>,
        config: &ReservationConfig,
    ) -> Self {
        Self {
            pool,
            clock,
            scheduler,
            hold_duration: hold_duration(config.hold_duration_secs),
        }
    }

    /// The engine's time source.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Atomically check capacity and create a time-bounded hold.
    ///
    /// On commit the new `PENDING` booking holds its units against the show
    /// and an expiry trigger is scheduled best-effort; a scheduling failure
    /// is logged, never fatal, because the sweep is the correctness
    /// backstop.
    ///
    /// # Errors
    ///
    /// - [`HoldError::EmptySelection`] when the selection names no units
    /// - [`HoldError::ShowNotFound`] when no inventory exists for the show
    /// - [`HoldError::NoCapacity`] (aggregate) when fewer units remain than
    ///   requested
    /// - [`HoldError::SeatUnavailable`] (granular) when any requested seat
    ///   is missing or not `AVAILABLE`; no partial mutation is made
    /// - [`HoldError::Storage`] on transient database failure
    #[tracing::instrument(skip(self, selection))]
    pub async fn create_hold(
        &self,
        show_id: ShowId,
        user_id: UserId,
        selection: Selection,
    ) -> Result<Booking, HoldError> {
        if selection.is_empty() {
            return Err(HoldError::EmptySelection);
        }

        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let ledger = inventory::lock(&mut tx, show_id)
            .await?
            .ok_or(HoldError::ShowNotFound(show_id))?;

        let now = self.clock.now();
        let expires_at = now + self.hold_duration;

        let booking = match selection {
            Selection::Quantity(requested) => {
                let requested = requested.get();
                if ledger.available() < requested {
                    return Err(HoldError::NoCapacity {
                        requested,
                        available: ledger.available(),
                    });
                }

                let booking = Booking {
                    id: BookingId::new(),
                    show_id,
                    user_id,
                    status: BookingStatus::Pending,
                    units: requested,
                    expires_at: Some(expires_at),
                    created_at: now,
                };
                bookings::insert(&mut tx, &booking).await?;
                inventory::adjust(&mut tx, show_id, delta(requested), 0).await?;
                booking
            }

            Selection::Seats(requested) => {
                let seat_ids = normalize(requested);
                let locked = seats::lock_for_selection(&mut tx, show_id, &seat_ids).await?;
                verify_all_available(&seat_ids, &locked)?;

                let units = u32::try_from(seat_ids.len()).unwrap_or(u32::MAX);
                let booking = Booking {
                    id: BookingId::new(),
                    show_id,
                    user_id,
                    status: BookingStatus::Pending,
                    units,
                    expires_at: Some(expires_at),
                    created_at: now,
                };
                bookings::insert(&mut tx, &booking).await?;
                seats::claim(&mut tx, &seat_ids, booking.id).await?;
                // Bookkeeping parity: the aggregate counters track the
                // per-seat rows even in granular mode.
                inventory::adjust(&mut tx, show_id, delta(units), 0).await?;
                booking
            }
        };

        tx.commit().await.map_err(storage_err)?;
        metrics::counter!("boxoffice.holds.created").increment(1);
        info!(booking_id = %booking.id, units = booking.units, "hold created");

        if let Err(err) = self.scheduler.schedule(booking.id, expires_at).await {
            // The sweep will still expire this hold.
            warn!(booking_id = %booking.id, error = %err, "failed to schedule expiry trigger");
            metrics::counter!("boxoffice.expiry.schedule_failures").increment(1);
        }

        Ok(booking)
    }

    /// Promote a pending hold to a permanent sale.
    ///
    /// Not idempotent by design: `CONFIRMED` is terminal, so a second
    /// confirm attempt fails with [`HoldError::InvalidState`].
    ///
    /// # Errors
    ///
    /// - [`HoldError::BookingNotFound`] when no such booking exists
    /// - [`HoldError::InvalidState`] when the booking is not `PENDING`
    /// - [`HoldError::BookingExpired`] when the deadline has passed; the
    ///   hold is expired and its units released before returning, so a late
    ///   confirm self-heals the stale hold instead of leaving it reserved
    /// - [`HoldError::Storage`] on transient database failure
    #[tracing::instrument(skip(self))]
    pub async fn confirm_hold(&self, booking_id: BookingId) -> Result<Booking, HoldError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let booking = bookings::lock(&mut tx, booking_id)
            .await?
            .ok_or(HoldError::BookingNotFound(booking_id))?;

        if booking.status != BookingStatus::Pending {
            return Err(HoldError::InvalidState {
                current: booking.status,
            });
        }

        if booking.is_lapsed(self.clock.now()) {
            release_hold(&mut tx, &booking).await?;
            tx.commit().await.map_err(storage_err)?;
            metrics::counter!("boxoffice.holds.expired", "path" => "late_confirm").increment(1);
            info!(booking_id = %booking.id, "late confirm expired the hold");
            return Err(HoldError::BookingExpired(booking_id));
        }

        bookings::mark(&mut tx, booking.id, BookingStatus::Confirmed).await?;
        // Inventory row before seat rows, the same order create uses, so
        // overlapping create/confirm on one show cannot deadlock.
        inventory::adjust(&mut tx, booking.show_id, -delta(booking.units), delta(booking.units))
            .await?;
        seats::mark_booked(&mut tx, booking.id).await?;

        tx.commit().await.map_err(storage_err)?;
        metrics::counter!("boxoffice.holds.confirmed").increment(1);
        info!(booking_id = %booking.id, units = booking.units, "hold confirmed");

        Ok(Booking {
            status: BookingStatus::Confirmed,
            expires_at: None,
            ..booking
        })
    }

    /// Expire a lapsed hold and release its units.
    ///
    /// Idempotent by construction: when the booking does not exist or is not
    /// `PENDING`, this is a committed no-op. That makes duplicate triggers,
    /// duplicate sweep discovery, and races with [`Self::confirm_hold`] all
    /// safe: the booking row lock ensures exactly one of
    /// `CONFIRMED`/`EXPIRED` wins.
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::Storage`] on transient database failure.
    #[tracing::instrument(skip(self))]
    pub async fn expire_hold(&self, booking_id: BookingId) -> Result<(), HoldError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let Some(booking) = bookings::lock(&mut tx, booking_id).await? else {
            return Ok(());
        };
        // Re-check under the lock: a confirm may have won the race between
        // trigger delivery and lock acquisition.
        if booking.status != BookingStatus::Pending {
            return Ok(());
        }

        release_hold(&mut tx, &booking).await?;
        tx.commit().await.map_err(storage_err)?;
        metrics::counter!("boxoffice.holds.expired", "path" => "direct").increment(1);
        info!(booking_id = %booking.id, units = booking.units, "hold expired");

        Ok(())
    }

    /// Expire every hold past its deadline, bounded to one batch.
    ///
    /// The sweep path: discovery takes no locks, and each candidate goes
    /// through [`Self::expire_hold`], which re-checks under its own lock.
    /// Returns the number of candidates processed. Individual failures are
    /// logged and skipped so one poisoned row cannot stall the sweep.
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::Storage`] when discovery itself fails.
    pub async fn expire_due(&self, batch_size: u32) -> Result<usize, HoldError> {
        let now = self.clock.now();
        let due = bookings::expired_pending(&self.pool, now, batch_size).await?;
        let mut processed = 0;
        for booking_id in due {
            match self.expire_hold(booking_id).await {
                Ok(()) => processed += 1,
                Err(err) => {
                    warn!(booking_id = %booking_id, error = %err, "sweep failed to expire hold");
                }
            }
        }
        Ok(processed)
    }

    /// Read a booking without locking (polling-friendly).
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::BookingNotFound`] when no such booking exists,
    /// or [`HoldError::Storage`] on driver failure.
    pub async fn booking(&self, booking_id: BookingId) -> Result<Booking, HoldError> {
        bookings::fetch(&self.pool, booking_id)
            .await?
            .ok_or(HoldError::BookingNotFound(booking_id))
    }

    /// Read a show's capacity ledger without locking (polling-friendly).
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::ShowNotFound`] when no such show exists, or
    /// [`HoldError::Storage`] on driver failure.
    pub async fn availability(&self, show_id: ShowId) -> Result<ShowInventory, HoldError> {
        inventory::fetch(&self.pool, show_id)
            .await?
            .ok_or(HoldError::ShowNotFound(show_id))
    }

    /// List a show's seats without locking (polling-friendly).
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::Storage`] on driver failure.
    pub async fn seats(&self, show_id: ShowId) -> Result<Vec<Seat>, HoldError> {
        seats::list_for_show(&self.pool, show_id).await
    }
}

/// Release a still-pending hold: mark it `EXPIRED`, return its units to the
/// available pool, and free its seats. Caller holds the booking row lock and
/// commits. Inventory row before seat rows, matching create's lock order.
async fn release_hold(
    tx: &mut Transaction<'_, Postgres>,
    booking: &Booking,
) -> Result<(), HoldError> {
    bookings::mark(tx, booking.id, BookingStatus::Expired).await?;
    inventory::adjust(tx, booking.show_id, -delta(booking.units), 0).await?;
    seats::release(tx, booking.id).await?;
    Ok(())
}

/// Dedup and sort ascending: the fixed seat lock order.
fn normalize(mut seat_ids: Vec<SeatId>) -> Vec<SeatId> {
    seat_ids.sort_unstable();
    seat_ids.dedup();
    seat_ids
}

/// Every requested seat must exist for this show and be `AVAILABLE`;
/// otherwise the offending seat is reported and nothing is mutated.
fn verify_all_available(requested: &[SeatId], locked: &[Seat]) -> Result<(), HoldError> {
    let by_id: HashMap<SeatId, SeatStatus> = locked.iter().map(|s| (s.id, s.status)).collect();
    for seat_id in requested {
        match by_id.get(seat_id) {
            Some(SeatStatus::Available) => {}
            _ => return Err(HoldError::SeatUnavailable { seat: *seat_id }),
        }
    }
    Ok(())
}

/// Unit count as a signed counter delta.
fn delta(units: u32) -> i32 {
    i32::try_from(units).unwrap_or(i32::MAX)
}

/// Holds are short-lived; a week is already generous. Clamping keeps
/// `now + hold_duration` inside the datetime range for any configured value.
const MAX_HOLD_SECS: u64 = 7 * 24 * 60 * 60;

fn hold_duration(secs: u64) -> Duration {
    let secs = secs.min(MAX_HOLD_SECS);
    Duration::seconds(i64::try_from(secs).unwrap_or(604_800))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boxoffice_core::types::{Money, SeatTier};

    fn seat(id: SeatId, status: SeatStatus) -> Seat {
        Seat {
            id,
            show_id: ShowId::new(),
            row: "A".to_string(),
            number: 1,
            tier: SeatTier::Regular,
            price: Money::from_cents(3000),
            status,
            booking_id: None,
        }
    }

    #[test]
    fn verify_reports_the_missing_seat() {
        let present = SeatId::new();
        let missing = SeatId::new();
        let locked = vec![seat(present, SeatStatus::Available)];

        let err = verify_all_available(&[present, missing], &locked).unwrap_err();
        assert_eq!(err, HoldError::SeatUnavailable { seat: missing });
    }

    #[test]
    fn verify_reports_the_held_seat() {
        let contested = SeatId::new();
        let locked = vec![seat(contested, SeatStatus::Locked)];

        let err = verify_all_available(&[contested], &locked).unwrap_err();
        assert_eq!(err, HoldError::SeatUnavailable { seat: contested });
    }

    #[test]
    fn verify_accepts_a_fully_available_selection() {
        let a = SeatId::new();
        let b = SeatId::new();
        let locked = vec![seat(a, SeatStatus::Available), seat(b, SeatStatus::Available)];
        assert!(verify_all_available(&[a, b], &locked).is_ok());
    }

    #[test]
    fn hold_duration_clamps_pathological_config() {
        assert_eq!(hold_duration(120), Duration::seconds(120));
        assert_eq!(hold_duration(MAX_HOLD_SECS), Duration::seconds(604_800));
        // Arithmetic on now + hold_duration must stay in range for any
        // configured value.
        assert_eq!(hold_duration(u64::MAX), Duration::seconds(604_800));
        let deadline = chrono::Utc::now() + hold_duration(u64::MAX);
        assert!(deadline > chrono::Utc::now());
    }

    #[test]
    fn normalize_gives_a_total_lock_order() {
        let a = SeatId::new();
        let b = SeatId::new();
        let normalized = normalize(vec![b, a, b, a]);
        assert_eq!(normalized.len(), 2);
        assert!(normalized[0] < normalized[1]);
    }
}
