use super::helpers::{
    fetch_booking, fetch_booking_for_update, maybe_fetch_booking_for_update, update_booking,
};
use super::Engine;

use async_trait::async_trait;
use sqlx::Acquire;
use uuid::Uuid;

use crate::{
    api::{CheckoutRedirect, PaymentAPI},
    auth::User,
    entities::{Booking, ServiceType, Status, WebhookOutcome},
    error::{invalid_input_error, invalid_state_error, no_remaining_balance_error, Error},
    external::stripe::{PaymentPurpose, SessionRequest, CHECKOUT_SESSION_COMPLETED},
};

impl Engine {
    pub(super) fn deposit_session_request(&self, booking: &Booking) -> SessionRequest {
        let product_name = match booking.service {
            ServiceType::AirportTransfer => format!(
                "Deposit for {} - {} to {}",
                booking.vehicle.label(),
                booking.pickup.address,
                booking.dropoff.address
            ),
            _ => format!("{} - Deposit", booking.service.label()),
        };

        SessionRequest {
            amount: booking.deposit_amount,
            product_name,
            description: format!("Total trip price: ${:.2}", booking.total_price),
            booking_id: booking.id,
            customer_id: booking.customer_id,
            purpose: PaymentPurpose::Deposit,
        }
    }

    fn final_session_request(&self, booking: &Booking, remaining: f64) -> SessionRequest {
        SessionRequest {
            amount: remaining,
            product_name: format!("Final payment for {}", booking.vehicle.label()),
            description: format!(
                "Remaining balance - {} to {}",
                booking.pickup.address, booking.dropoff.address
            ),
            booking_id: booking.id,
            customer_id: booking.customer_id,
            purpose: PaymentPurpose::Final,
        }
    }
}

#[async_trait]
impl PaymentAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn continue_payment(&self, user: User, id: Uuid) -> Result<CheckoutRedirect, Error> {
        let mut conn = self.pool.acquire().await?;
        let booking = fetch_booking(&mut *conn, &id).await?;

        self.authorize(user.clone(), "continue_payment", booking.clone())?;

        if booking.deposit_paid {
            return Err(invalid_state_error("the deposit is already paid"));
        }

        if booking.status != Status::Pending {
            return Err(invalid_state_error(format!(
                "a {} booking has no deposit payment open",
                booking.status.name()
            )));
        }

        if booking.deposit_amount <= 0.0 {
            return Err(invalid_input_error("booking carries no deposit amount"));
        }

        let session = self
            .payments
            .create_session(self.deposit_session_request(&booking))
            .await?;

        let mut tx = conn.begin().await?;
        let mut booking = fetch_booking_for_update(&mut tx, &id).await?;

        if booking.status != Status::Pending || booking.deposit_paid {
            return Err(invalid_state_error(
                "booking changed while the checkout session was created",
            ));
        }

        booking.attach_checkout(&session.id, &session.url);
        update_booking(&mut tx, &booking, "Pending").await?;

        tx.commit().await?;

        Ok(CheckoutRedirect { url: session.url })
    }

    #[tracing::instrument(skip(self))]
    async fn request_final_payment(
        &self,
        user: User,
        id: Uuid,
    ) -> Result<CheckoutRedirect, Error> {
        let mut conn = self.pool.acquire().await?;
        let booking = fetch_booking(&mut *conn, &id).await?;

        self.authorize(user.clone(), "request_final_payment", booking.clone())?;

        let remaining = booking.remaining_balance();

        if remaining <= 0.0 {
            return Err(no_remaining_balance_error());
        }

        if booking.status != Status::Approved {
            return Err(invalid_state_error(format!(
                "final payment cannot be requested for a {} booking",
                booking.status.name()
            )));
        }

        let session = self
            .payments
            .create_session(self.final_session_request(&booking, remaining))
            .await?;

        let mut tx = conn.begin().await?;
        let mut booking = fetch_booking_for_update(&mut tx, &id).await?;

        let prior = booking.status.name();
        booking.request_final_payment(&session.id, &session.url)?;
        update_booking(&mut tx, &booking, &prior).await?;

        tx.commit().await?;

        tracing::info!(booking_id = %booking.id, "final payment requested");

        Ok(CheckoutRedirect { url: session.url })
    }

    #[tracing::instrument(skip(self, payload))]
    async fn process_webhook(&self, payload: &[u8], signature_header: &str) -> Result<(), Error> {
        let event = self.payments.construct_event(payload, signature_header)?;

        if event.event_type != CHECKOUT_SESSION_COMPLETED {
            tracing::debug!(event_type = %event.event_type, "ignoring webhook event");
            return Ok(());
        }

        let object = event.data.object;

        let booking_id = match object
            .metadata
            .booking_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
        {
            Some(id) => id,
            None => {
                tracing::error!(
                    session_id = %object.id,
                    "completed checkout session carries no usable booking id"
                );
                return Ok(());
            }
        };

        let purpose = object.metadata.purpose();

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut booking = match maybe_fetch_booking_for_update(&mut tx, &booking_id).await? {
            Some(booking) => booking,
            None => {
                tracing::warn!(%booking_id, "webhook for an unknown booking, acknowledging");
                return Ok(());
            }
        };

        let prior = booking.status.name();
        let reference = object.payment_intent.as_deref();

        let outcome = match purpose {
            PaymentPurpose::Deposit => booking.apply_deposit_paid(reference),
            PaymentPurpose::Final => booking.apply_final_paid(reference),
        };

        match outcome {
            Ok(WebhookOutcome::Applied) => {
                update_booking(&mut tx, &booking, &prior).await?;
                tx.commit().await?;

                tracing::info!(
                    %booking_id,
                    purpose = purpose.as_str(),
                    status = %booking.status.name(),
                    "payment applied"
                );
            }
            Ok(WebhookOutcome::AlreadyApplied) => {
                tracing::info!(
                    %booking_id,
                    purpose = purpose.as_str(),
                    "duplicate payment event, skipping update"
                );
            }
            Err(err) => {
                // verified payment against a booking that cannot take it,
                // needs an operator
                tracing::error!(
                    %booking_id,
                    purpose = purpose.as_str(),
                    code = err.code,
                    message = %err.message,
                    "payment event rejected by the state machine"
                );
            }
        }

        Ok(())
    }
}
