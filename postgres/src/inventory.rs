//! Inventory store: the persisted capacity ledger, one row per show.
//!
//! The `show_inventory` row is the unit of mutual exclusion for a show.
//! Every hold/confirm/expire locks it first via [`lock`]; the check and the
//! counter mutation then commit atomically, so no two concurrent holds can
//! observe stale availability and both succeed beyond capacity.

use crate::{from_db_units, seats, storage_err, to_db_units};
use boxoffice_core::types::{SeatingPlan, ShowId, ShowInventory};
use boxoffice_core::HoldError;
use sqlx::{PgPool, Postgres, Transaction};

/// Seed the capacity ledger for a newly published show (aggregate mode).
///
/// Owned by the catalog collaborator in production; tests use it directly.
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure (including a duplicate
/// publish of the same show).
#[tracing::instrument(skip(pool))]
pub async fn publish(
    pool: &PgPool,
    show_id: ShowId,
    total_units: u32,
) -> Result<ShowInventory, HoldError> {
    sqlx::query(
        "INSERT INTO show_inventory (show_id, total_units, reserved_units, confirmed_units)
         VALUES ($1, $2, 0, 0)",
    )
    .bind(show_id.as_uuid())
    .bind(to_db_units(total_units))
    .execute(pool)
    .await
    .map_err(storage_err)?;

    Ok(ShowInventory {
        show_id,
        total_units,
        reserved_units: 0,
        confirmed_units: 0,
    })
}

/// Seed the ledger and the full seat grid in one transaction (granular mode).
///
/// `total_units` is the plan's capacity, so aggregate counters stay in
/// bookkeeping parity with the per-seat rows.
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure; nothing is persisted
/// partially.
#[tracing::instrument(skip(pool, plan), fields(capacity = plan.capacity()))]
pub async fn publish_with_seats(
    pool: &PgPool,
    show_id: ShowId,
    plan: &SeatingPlan,
) -> Result<ShowInventory, HoldError> {
    let mut tx = pool.begin().await.map_err(storage_err)?;

    sqlx::query(
        "INSERT INTO show_inventory (show_id, total_units, reserved_units, confirmed_units)
         VALUES ($1, $2, 0, 0)",
    )
    .bind(show_id.as_uuid())
    .bind(to_db_units(plan.capacity()))
    .execute(&mut *tx)
    .await
    .map_err(storage_err)?;

    seats::insert_many(&mut tx, &plan.generate(show_id)).await?;

    tx.commit().await.map_err(storage_err)?;

    Ok(ShowInventory {
        show_id,
        total_units: plan.capacity(),
        reserved_units: 0,
        confirmed_units: 0,
    })
}

/// Lock the show's ledger row exclusively for the rest of the transaction.
///
/// Returns `None` when the show does not exist.
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure (including lock
/// acquisition timeout).
pub async fn lock(
    tx: &mut Transaction<'_, Postgres>,
    show_id: ShowId,
) -> Result<Option<ShowInventory>, HoldError> {
    let row: Option<(i32, i32, i32)> = sqlx::query_as(
        "SELECT total_units, reserved_units, confirmed_units
         FROM show_inventory
         WHERE show_id = $1
         FOR UPDATE",
    )
    .bind(show_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(storage_err)?;

    Ok(row.map(|(total, reserved, confirmed)| ShowInventory {
        show_id,
        total_units: from_db_units(total),
        reserved_units: from_db_units(reserved),
        confirmed_units: from_db_units(confirmed),
    }))
}

/// Read the ledger without locking (polling-friendly).
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver failure.
pub async fn fetch(pool: &PgPool, show_id: ShowId) -> Result<Option<ShowInventory>, HoldError> {
    let row: Option<(i32, i32, i32)> = sqlx::query_as(
        "SELECT total_units, reserved_units, confirmed_units
         FROM show_inventory
         WHERE show_id = $1",
    )
    .bind(show_id.as_uuid())
    .fetch_optional(pool)
    .await
    .map_err(storage_err)?;

    Ok(row.map(|(total, reserved, confirmed)| ShowInventory {
        show_id,
        total_units: from_db_units(total),
        reserved_units: from_db_units(reserved),
        confirmed_units: from_db_units(confirmed),
    }))
}

/// Apply counter deltas to a ledger row already locked in this transaction.
///
/// The `CHECK` constraints reject any delta that would break
/// `0 <= reserved + confirmed <= total`.
///
/// # Errors
///
/// Returns [`HoldError::Storage`] on driver or constraint failure.
pub async fn adjust(
    tx: &mut Transaction<'_, Postgres>,
    show_id: ShowId,
    reserved_delta: i32,
    confirmed_delta: i32,
) -> Result<(), HoldError> {
    sqlx::query(
        "UPDATE show_inventory
         SET reserved_units = reserved_units + $2,
             confirmed_units = confirmed_units + $3
         WHERE show_id = $1",
    )
    .bind(show_id.as_uuid())
    .bind(reserved_delta)
    .bind(confirmed_delta)
    .execute(&mut **tx)
    .await
    .map_err(storage_err)?;

    Ok(())
}
