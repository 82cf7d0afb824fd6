use super::Database;

use chrono::{DateTime, Utc};
use sqlx::{types::Json, Executor, Row, Transaction};
use uuid::Uuid;

use crate::{
    entities::Booking,
    error::{conflict_active_booking_error, invalid_state_error, not_found_error, Error},
};

#[tracing::instrument(skip(executor))]
pub async fn fetch_booking<'e, E>(executor: E, id: &Uuid) -> Result<Booking, Error>
where
    E: Executor<'e, Database = Database>,
{
    let Json(booking): Json<Booking> = executor
        .fetch_optional(sqlx::query("SELECT data FROM bookings WHERE id = $1").bind(id))
        .await?
        .ok_or_else(not_found_error)?
        .try_get("data")?;

    Ok(booking)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_booking_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Booking, Error> {
    maybe_fetch_booking_for_update(tx, id)
        .await?
        .ok_or_else(not_found_error)
}

#[tracing::instrument(skip(tx))]
pub async fn maybe_fetch_booking_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Option<Booking>, Error> {
    let row = tx
        .fetch_optional(sqlx::query("SELECT data FROM bookings WHERE id = $1 FOR UPDATE").bind(id))
        .await?;

    match row {
        Some(row) => {
            let Json(booking): Json<Booking> = row.try_get("data")?;
            Ok(Some(booking))
        }
        None => Ok(None),
    }
}

#[tracing::instrument(skip(tx, booking))]
pub async fn insert_booking(
    tx: &mut Transaction<'_, Database>,
    booking: &Booking,
) -> Result<(), Error> {
    let result = tx
        .execute(
            sqlx::query(
                "INSERT INTO bookings (id, customer_id, vehicle, status, scheduled_at, created_at, data)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(&booking.id)
            .bind(&booking.customer_id)
            .bind(booking.vehicle.as_str())
            .bind(booking.status.name())
            .bind(booking.scheduled_at)
            .bind(booking.created_at)
            .bind(Json(booking)),
        )
        .await;

    match result {
        Ok(_) => Ok(()),
        // the partial unique index rejects a second live booking per customer
        Err(sqlx::Error::Database(err)) if err.code().as_deref() == Some("23505") => {
            Err(conflict_active_booking_error())
        }
        Err(err) => Err(err.into()),
    }
}

/// Writes the booking back, guarded by the status it was read under. Zero
/// rows affected means another writer got there first.
#[tracing::instrument(skip(tx, booking))]
pub async fn update_booking(
    tx: &mut Transaction<'_, Database>,
    booking: &Booking,
    expected_status: &str,
) -> Result<(), Error> {
    let result = tx
        .execute(
            sqlx::query("UPDATE bookings SET status = $2, data = $3 WHERE id = $1 AND status = $4")
                .bind(&booking.id)
                .bind(booking.status.name())
                .bind(Json(booking))
                .bind(expected_status),
        )
        .await?;

    if result.rows_affected() == 0 {
        return Err(invalid_state_error("booking was modified concurrently"));
    }

    Ok(())
}

#[tracing::instrument(skip(executor))]
pub async fn has_active_booking<'e, E>(executor: E, customer_id: &Uuid) -> Result<bool, Error>
where
    E: Executor<'e, Database = Database>,
{
    let row = executor
        .fetch_optional(
            sqlx::query(
                "SELECT id FROM bookings
                 WHERE customer_id = $1
                 AND status IN ('Pending', 'Approved', 'AwaitingFinalPayment')
                 LIMIT 1",
            )
            .bind(customer_id),
        )
        .await?;

    Ok(row.is_some())
}

#[tracing::instrument(skip(executor))]
pub async fn vehicle_booked_near<'e, E>(
    executor: E,
    vehicle: &str,
    scheduled_at: &DateTime<Utc>,
    window: chrono::Duration,
) -> Result<bool, Error>
where
    E: Executor<'e, Database = Database>,
{
    let from = *scheduled_at - window;
    let to = *scheduled_at + window;

    let row = executor
        .fetch_optional(
            sqlx::query(
                "SELECT id FROM bookings
                 WHERE vehicle = $1
                 AND status IN ('Pending', 'Approved', 'AwaitingFinalPayment')
                 AND scheduled_at BETWEEN $2 AND $3
                 LIMIT 1",
            )
            .bind(vehicle)
            .bind(from)
            .bind(to),
        )
        .await?;

    Ok(row.is_some())
}
