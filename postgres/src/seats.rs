//! Per-seat inventory rows (granular mode).
//!
//! Seats are created in bulk when a show is published and mutated only by
//! the reservation engine. A seat's `booking_id` is non-null exactly when
//! its status is `LOCKED` or `BOOKED`; the schema enforces this.

use crate::{from_db_units, storage_err, to_db_units};
use boxoffice_core::types::{BookingId, Money, Seat, SeatId, SeatStatus, SeatTier, ShowId};
use boxoffice_core::HoldError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Raw seat row as stored.
#[derive(sqlx::FromRow)]
struct SeatRow {
    id: Uuid,
    show_id: Uuid,
    row_label: String,
    seat_number: i32,
    tier: String,
    price_cents: i64,
    status: String,
    booking_id: Option<Uuid>,
}

impl SeatRow {
    fn into_seat(self) -> Result<Seat, HoldError> {
        let tier = SeatTier::parse(&self.tier)
            .ok_or_else(|| HoldError::Storage(format!("unknown seat tier: {}", self.tier)))?;
        let status = SeatStatus::parse(&self.status)
            .ok_or_else(|| HoldError::Storage(format!("unknown seat status: {}", self.status)))?;
        Ok(Seat {
            id: SeatId::from_uuid(self.id),
            show_id: ShowId::from_uuid(self.show_id),
            row: self.row_label,
            number: from_db_units(self.seat_number),
            tier,
            price: Money::from_cents(u64::try_from(self.price_cents).unwrap_or(0)),
            status,
            booking_id: self.booking_id.map(BookingId::from_uuid),
        })
    }
}

/// Bulk-insert freshly generated seats for a published show.
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure.
pub async fn insert_many(
    tx: &mut Transaction<'_, Postgres>,
    seats: &[Seat],
) -> Result<(), HoldError> {
    for seat in seats {
        sqlx::query(
            "INSERT INTO seats (id, show_id, row_label, seat_number, tier, price_cents, status, booking_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(seat.id.as_uuid())
        .bind(seat.show_id.as_uuid())
        .bind(&seat.row)
        .bind(to_db_units(seat.number))
        .bind(seat.tier.as_str())
        .bind(i64::try_from(seat.price.cents()).unwrap_or(i64::MAX))
        .bind(seat.status.as_str())
        .bind(seat.booking_id.map(|id| *id.as_uuid()))
        .execute(&mut **tx)
        .await
        .map_err(storage_err)?;
    }
    Ok(())
}

/// Lock the requested seat rows exclusively, in ascending seat id order.
///
/// The fixed order gives concurrent overlapping requests a total lock order
/// and thereby prevents lock-ordering deadlocks. Seats that do not exist for
/// this show are simply absent from the result; the caller detects them by
/// comparing lengths.
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure.
pub async fn lock_for_selection(
    tx: &mut Transaction<'_, Postgres>,
    show_id: ShowId,
    seat_ids: &[SeatId],
) -> Result<Vec<Seat>, HoldError> {
    let ids: Vec<Uuid> = seat_ids.iter().map(|id| *id.as_uuid()).collect();
    let rows: Vec<SeatRow> = sqlx::query_as(
        "SELECT id, show_id, row_label, seat_number, tier, price_cents, status, booking_id
         FROM seats
         WHERE show_id = $1 AND id = ANY($2)
         ORDER BY id
         FOR UPDATE",
    )
    .bind(show_id.as_uuid())
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await
    .map_err(storage_err)?;

    rows.into_iter().map(SeatRow::into_seat).collect()
}

/// Mark already-locked seats as held by a pending booking.
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure.
pub async fn claim(
    tx: &mut Transaction<'_, Postgres>,
    seat_ids: &[SeatId],
    booking_id: BookingId,
) -> Result<(), HoldError> {
    let ids: Vec<Uuid> = seat_ids.iter().map(|id| *id.as_uuid()).collect();
    sqlx::query("UPDATE seats SET status = 'LOCKED', booking_id = $2 WHERE id = ANY($1)")
        .bind(&ids)
        .bind(booking_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(storage_err)?;
    Ok(())
}

/// Promote every seat held by this booking to sold.
///
/// Returns the number of seats promoted (zero in aggregate mode).
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure.
pub async fn mark_booked(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: BookingId,
) -> Result<u64, HoldError> {
    let result = sqlx::query("UPDATE seats SET status = 'BOOKED' WHERE booking_id = $1")
        .bind(booking_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(storage_err)?;
    Ok(result.rows_affected())
}

/// Return every seat held by this booking to the available pool.
///
/// Returns the number of seats released (zero in aggregate mode).
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure.
pub async fn release(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: BookingId,
) -> Result<u64, HoldError> {
    let result =
        sqlx::query("UPDATE seats SET status = 'AVAILABLE', booking_id = NULL WHERE booking_id = $1")
            .bind(booking_id.as_uuid())
            .execute(&mut **tx)
            .await
            .map_err(storage_err)?;
    Ok(result.rows_affected())
}

/// List a show's seats without locking (polling-friendly).
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure.
pub async fn list_for_show(pool: &PgPool, show_id: ShowId) -> Result<Vec<Seat>, HoldError> {
    let rows: Vec<SeatRow> = sqlx::query_as(
        "SELECT id, show_id, row_label, seat_number, tier, price_cents, status, booking_id
         FROM seats
         WHERE show_id = $1
         ORDER BY row_label, seat_number",
    )
    .bind(show_id.as_uuid())
    .fetch_all(pool)
    .await
    .map_err(storage_err)?;

    rows.into_iter().map(SeatRow::into_seat).collect()
}
