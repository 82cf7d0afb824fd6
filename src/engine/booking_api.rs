use super::helpers::{
    fetch_booking, fetch_booking_for_update, has_active_booking, insert_booking, update_booking,
    vehicle_booked_near,
};
use super::Engine;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::{BookingAPI, BookingRequest},
    auth::{Platform, User},
    entities::{AddOn, Booking},
    error::{
        conflict_active_booking_error, conflict_vehicle_unavailable_error, invalid_input_error,
        Error,
    },
};

#[async_trait]
impl BookingAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_booking(&self, user: User, request: BookingRequest) -> Result<Booking, Error> {
        self.authorize(user.clone(), "create_booking", Platform::default())?;

        let add_ons = request
            .details
            .add_ons
            .iter()
            .map(AddOn::from_request)
            .collect::<Result<Vec<_>, _>>()?;

        let quote = self.quote_for_request(&request.details).await?;

        let mut booking = Booking::new(
            user.id,
            request.details.service,
            request.details.vehicle,
            request.details.pickup.clone(),
            request.details.dropoff.clone(),
            request.scheduled_at,
            request.details.event.clone(),
            add_ons,
            &quote,
        );

        let mut conn = self.pool.acquire().await?;

        // cheap pre-checks before touching the payment provider
        if has_active_booking(&mut *conn, &user.id).await? {
            return Err(conflict_active_booking_error());
        }

        if vehicle_booked_near(
            &mut *conn,
            booking.vehicle.as_str(),
            &booking.scheduled_at,
            self.vehicle_conflict_window,
        )
        .await?
        {
            return Err(conflict_vehicle_unavailable_error(booking.vehicle.label()));
        }

        let session = self
            .payments
            .create_session(self.deposit_session_request(&booking))
            .await?;
        booking.attach_checkout(&session.id, &session.url);

        let mut tx = conn.begin().await?;

        // serialize creations per vehicle on the fleet row
        tx.fetch_optional(
            sqlx::query("SELECT name FROM vehicles WHERE name = $1 FOR UPDATE")
                .bind(booking.vehicle.as_str()),
        )
        .await?
        .ok_or_else(|| invalid_input_error("unknown vehicle class"))?;

        if has_active_booking(&mut *tx, &user.id).await? {
            return Err(conflict_active_booking_error());
        }

        if vehicle_booked_near(
            &mut *tx,
            booking.vehicle.as_str(),
            &booking.scheduled_at,
            self.vehicle_conflict_window,
        )
        .await?
        {
            return Err(conflict_vehicle_unavailable_error(booking.vehicle.label()));
        }

        insert_booking(&mut tx, &booking).await?;
        tx.commit().await?;

        tracing::info!(booking_id = %booking.id, "booking created");

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn find_booking(&self, user: User, id: Uuid) -> Result<Booking, Error> {
        let mut conn = self.pool.acquire().await?;
        let booking = fetch_booking(&mut *conn, &id).await?;

        self.authorize(user.clone(), "read", booking.clone())?;

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn active_booking(&self, user: User) -> Result<Option<Booking>, Error> {
        self.authorize(user.clone(), "read_own_bookings", Platform::default())?;

        let mut conn = self.pool.acquire().await?;

        let row = conn
            .fetch_optional(
                sqlx::query(
                    "SELECT data FROM bookings
                     WHERE customer_id = $1
                     AND status IN ('Pending', 'Approved', 'AwaitingFinalPayment')
                     ORDER BY created_at DESC
                     LIMIT 1",
                )
                .bind(&user.id),
            )
            .await?;

        match row {
            Some(row) => {
                let Json(booking): Json<Booking> = row.try_get("data")?;
                Ok(Some(booking))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn booking_history(&self, user: User) -> Result<Vec<Booking>, Error> {
        self.authorize(user.clone(), "read_own_bookings", Platform::default())?;

        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM bookings
                     WHERE customer_id = $1
                     AND status IN ('Completed', 'Cancelled')
                     ORDER BY created_at DESC",
                )
                .bind(&user.id),
            )
            .await?;

        let mut bookings = Vec::with_capacity(rows.len());
        for row in rows {
            let Json(booking): Json<Booking> = row.try_get("data")?;
            bookings.push(booking);
        }

        Ok(bookings)
    }

    #[tracing::instrument(skip(self))]
    async fn list_bookings(&self, user: User) -> Result<Vec<Booking>, Error> {
        self.authorize(user.clone(), "list_bookings", Platform::default())?;

        let mut conn = self.pool.acquire().await?;

        let mut rows =
            conn.fetch(sqlx::query("SELECT data FROM bookings ORDER BY created_at DESC"));

        let mut bookings = Vec::new();
        while let Some(row) = rows.try_next().await? {
            let Json(booking): Json<Booking> = row.try_get("data")?;
            bookings.push(booking);
        }

        Ok(bookings)
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_booking(&self, user: User, id: Uuid) -> Result<Booking, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut booking = fetch_booking_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "cancel", booking.clone())?;

        let prior = booking.status.name();
        booking.cancel()?;
        update_booking(&mut tx, &booking, &prior).await?;

        tx.commit().await?;

        tracing::info!(booking_id = %booking.id, "booking cancelled");

        Ok(booking)
    }
}
