//! Schema migrations for the inventory store and booking ledger.
//!
//! Idempotent `CREATE ... IF NOT EXISTS` statements, run once at startup
//! (and by tests against throwaway containers).
//!
//! The `CHECK` constraints are a second line of defense: the row locks in
//! [`crate::inventory`] and [`crate::bookings`] already serialize mutators,
//! but a violated constraint turns a logic bug into a rolled-back
//! transaction instead of silent overselling.

use sqlx::PgPool;

/// Create all tables and indexes.
///
/// # Errors
///
/// Returns the driver error if any DDL statement fails.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS show_inventory (
            show_id         UUID PRIMARY KEY,
            total_units     INT NOT NULL CHECK (total_units >= 1),
            reserved_units  INT NOT NULL DEFAULT 0 CHECK (reserved_units >= 0),
            confirmed_units INT NOT NULL DEFAULT 0 CHECK (confirmed_units >= 0),
            CHECK (reserved_units + confirmed_units <= total_units)
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS bookings (
            id         UUID PRIMARY KEY,
            show_id    UUID NOT NULL REFERENCES show_inventory(show_id),
            user_id    UUID NOT NULL,
            status     TEXT NOT NULL,
            units      INT NOT NULL CHECK (units >= 1),
            expires_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        ",
    )
    .execute(pool)
    .await?;

    // The sweep scans this: PENDING rows ordered by deadline.
    sqlx::query(
        r"
        CREATE INDEX IF NOT EXISTS idx_bookings_pending_deadline
        ON bookings (expires_at)
        WHERE status = 'PENDING'
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS seats (
            id          UUID PRIMARY KEY,
            show_id     UUID NOT NULL REFERENCES show_inventory(show_id),
            row_label   TEXT NOT NULL,
            seat_number INT NOT NULL CHECK (seat_number >= 1),
            tier        TEXT NOT NULL,
            price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
            status      TEXT NOT NULL,
            booking_id  UUID REFERENCES bookings(id),
            UNIQUE (show_id, row_label, seat_number),
            CHECK ((booking_id IS NULL) = (status = 'AVAILABLE'))
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE INDEX IF NOT EXISTS idx_seats_by_booking
        ON seats (booking_id)
        WHERE booking_id IS NOT NULL
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_seats_by_show ON seats (show_id, id)")
        .execute(pool)
        .await?;

    tracing::info!("schema migrated");
    Ok(())
}
