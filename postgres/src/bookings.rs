//! Booking ledger: one row per hold or sale, never deleted.
//!
//! Rows are the audit trail of the system. Status transitions are
//! one-directional (`PENDING` to a terminal state) and always happen under a
//! `FOR UPDATE` lock on the booking row, which makes racing confirm/expire
//! mutually exclusive.

use crate::{from_db_units, storage_err, to_db_units};
use boxoffice_core::types::{Booking, BookingId, BookingStatus, ShowId, UserId};
use boxoffice_core::HoldError;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Raw booking row as stored.
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    show_id: Uuid,
    user_id: Uuid,
    status: String,
    units: i32,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, HoldError> {
        let status = BookingStatus::parse(&self.status).ok_or_else(|| {
            HoldError::Storage(format!("unknown booking status: {}", self.status))
        })?;
        Ok(Booking {
            id: BookingId::from_uuid(self.id),
            show_id: ShowId::from_uuid(self.show_id),
            user_id: UserId::from_uuid(self.user_id),
            status,
            units: from_db_units(self.units),
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

const COLUMNS: &str = "id, show_id, user_id, status, units, expires_at, created_at";

/// Insert a new ledger row.
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure.
pub async fn insert(tx: &mut Transaction<'_, Postgres>, booking: &Booking) -> Result<(), HoldError> {
    sqlx::query(
        "INSERT INTO bookings (id, show_id, user_id, status, units, expires_at, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(booking.id.as_uuid())
    .bind(booking.show_id.as_uuid())
    .bind(booking.user_id.as_uuid())
    .bind(booking.status.as_str())
    .bind(to_db_units(booking.units))
    .bind(booking.expires_at)
    .bind(booking.created_at)
    .execute(&mut **tx)
    .await
    .map_err(storage_err)?;
    Ok(())
}

/// Lock a booking row exclusively for the rest of the transaction.
///
/// Returns `None` when no such booking exists.
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure.
pub async fn lock(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: BookingId,
) -> Result<Option<Booking>, HoldError> {
    let row: Option<BookingRow> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"))
            .bind(booking_id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(storage_err)?;
    row.map(BookingRow::into_booking).transpose()
}

/// Move an already-locked booking to a terminal status.
///
/// Clears `expires_at`: the deadline only has meaning while the booking is
/// pending.
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure.
pub async fn mark(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: BookingId,
    status: BookingStatus,
) -> Result<(), HoldError> {
    sqlx::query("UPDATE bookings SET status = $2, expires_at = NULL WHERE id = $1")
        .bind(booking_id.as_uuid())
        .bind(status.as_str())
        .execute(&mut **tx)
        .await
        .map_err(storage_err)?;
    Ok(())
}

/// Read a booking without locking (polling-friendly).
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure.
pub async fn fetch(pool: &PgPool, booking_id: BookingId) -> Result<Option<Booking>, HoldError> {
    let row: Option<BookingRow> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM bookings WHERE id = $1"))
            .bind(booking_id.as_uuid())
            .fetch_optional(pool)
            .await
            .map_err(storage_err)?;
    row.map(BookingRow::into_booking).transpose()
}

/// Find holds past their deadline, oldest first, bounded to a batch.
///
/// Sweep discovery only; takes no locks. Each returned id goes through the
/// idempotent expire operation, which re-checks status under its own lock.
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure.
pub async fn expired_pending(
    pool: &PgPool,
    now: DateTime<Utc>,
    limit: u32,
) -> Result<Vec<BookingId>, HoldError> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM bookings
         WHERE status = 'PENDING' AND expires_at < $1
         ORDER BY expires_at
         LIMIT $2",
    )
    .bind(now)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await
    .map_err(storage_err)?;

    Ok(rows.into_iter().map(|(id,)| BookingId::from_uuid(id)).collect())
}
