use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Location, Quote, VehicleClass};
use crate::error::{invalid_input_error, invalid_state_error, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    AirportTransfer,
    WeddingShuttle,
    Engagement,
    Ceremony,
}

impl ServiceType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::AirportTransfer => "Airport Transfer",
            Self::WeddingShuttle => "Wedding Shuttle Service",
            Self::Engagement => "Engagement Service",
            Self::Ceremony => "Ceremony Shuttle",
        }
    }
}

/// Optional extras a customer can attach to an event booking. Prices are
/// fixed server side, never taken from the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddOnService {
    CeremonyPickupDropoff,
}

impl AddOnService {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CeremonyPickupDropoff => {
                "Ceremony guest pickup & drop-off (1-3 hours before ceremony)"
            }
        }
    }

    pub fn flat_charge(&self) -> f64 {
        match self {
            Self::CeremonyPickupDropoff => 750.0,
        }
    }

    pub fn hour_bounds(&self) -> (u32, u32) {
        match self {
            Self::CeremonyPickupDropoff => (1, 3),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddOnRequest {
    pub service: AddOnService,
    pub duration_hours: Option<u32>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddOn {
    pub service: AddOnService,
    pub name: String,
    pub price: f64,
    pub duration_hours: Option<u32>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl AddOn {
    pub fn from_request(request: &AddOnRequest) -> Result<Self, Error> {
        let (min_hours, max_hours) = request.service.hour_bounds();

        if let Some(hours) = request.duration_hours {
            if hours < min_hours || hours > max_hours {
                return Err(invalid_input_error(format!(
                    "{} runs between {} and {} hours",
                    request.service.label(),
                    min_hours,
                    max_hours
                )));
            }
        }

        Ok(Self {
            service: request.service,
            name: request.service.label().into(),
            price: request.service.flat_charge(),
            duration_hours: request.duration_hours,
            location: request.location.clone(),
            notes: request.notes.clone(),
        })
    }
}

/// Timing details for event services. `hours` is the booked block for
/// engagement and ceremony services, `additional_hours` extends a wedding
/// shuttle past its four hour base.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventDetails {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub additional_hours: u32,
}

impl EventDetails {
    pub fn wedding_default() -> Self {
        Self {
            start_time: Some("22:00".into()),
            end_time: Some("02:00".into()),
            hours: 0,
            additional_hours: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Approved,
    AwaitingFinalPayment,
    Completed,
    Cancelled,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Pending => "Pending".into(),
            Self::Approved => "Approved".into(),
            Self::AwaitingFinalPayment => "AwaitingFinalPayment".into(),
            Self::Completed => "Completed".into(),
            Self::Cancelled => "Cancelled".into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl PolarClass for Status {
    fn get_polar_class_builder() -> oso::ClassBuilder<Status> {
        oso::Class::builder()
            .name("BookingStatus")
            .add_attribute_getter("name", |recv: &Status| recv.name())
    }

    fn get_polar_class() -> oso::Class {
        let builder = Status::get_polar_class_builder();
        builder.build()
    }
}

/// Whether a payment event changed anything. Providers redeliver events, so
/// a replay has to be told apart from a first delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied,
    AlreadyApplied,
}

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
pub struct Booking {
    #[polar(attribute)]
    pub id: Uuid,
    #[polar(attribute)]
    pub customer_id: Uuid,
    #[polar(attribute)]
    pub status: Status,
    pub service: ServiceType,
    pub vehicle: VehicleClass,
    pub pickup: Location,
    pub dropoff: Location,
    pub scheduled_at: DateTime<Utc>,
    pub event: Option<EventDetails>,
    pub add_ons: Vec<AddOn>,
    pub total_price: f64,
    pub deposit_amount: f64,
    pub deposit_paid: bool,
    pub final_paid: bool,
    pub checkout_session_id: Option<String>,
    pub checkout_url: Option<String>,
    pub final_payment_url: Option<String>,
    pub payment_reference: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        customer_id: Uuid,
        service: ServiceType,
        vehicle: VehicleClass,
        pickup: Location,
        dropoff: Location,
        scheduled_at: DateTime<Utc>,
        event: Option<EventDetails>,
        add_ons: Vec<AddOn>,
        quote: &Quote,
    ) -> Self {
        let event = match (event, service) {
            (Some(details), _) => Some(details),
            (None, ServiceType::WeddingShuttle) => Some(EventDetails::wedding_default()),
            (None, _) => None,
        };

        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            customer_id,
            status: Status::Pending,
            service,
            vehicle,
            pickup,
            dropoff,
            scheduled_at,
            event,
            add_ons,
            total_price: quote.total_price,
            deposit_amount: quote.deposit_amount,
            deposit_paid: false,
            final_paid: false,
            checkout_session_id: None,
            checkout_url: None,
            final_payment_url: None,
            payment_reference: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn remaining_balance(&self) -> f64 {
        self.total_price - self.deposit_amount
    }

    pub fn attach_checkout(&mut self, session_id: &str, url: &str) {
        self.checkout_session_id = Some(session_id.into());
        self.checkout_url = Some(url.into());
        self.touch();
    }

    #[tracing::instrument]
    pub fn cancel(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Pending => {
                self.status = Status::Cancelled;
                self.touch();
                Ok(())
            }
            _ => Err(invalid_state_error(format!(
                "a {} booking cannot be cancelled",
                self.status.name()
            ))),
        }
    }

    /// Deposit confirmation from the payment provider. Replays are
    /// acknowledged without another transition.
    #[tracing::instrument]
    pub fn apply_deposit_paid(
        &mut self,
        payment_reference: Option<&str>,
    ) -> Result<WebhookOutcome, Error> {
        if self.deposit_paid {
            return Ok(WebhookOutcome::AlreadyApplied);
        }

        match self.status {
            Status::Pending | Status::Approved => {
                self.status = Status::Approved;
                self.deposit_paid = true;
                if let Some(reference) = payment_reference {
                    self.payment_reference = Some(reference.into());
                }
                self.touch();
                Ok(WebhookOutcome::Applied)
            }
            _ => Err(invalid_state_error(format!(
                "deposit payment arrived for a {} booking",
                self.status.name()
            ))),
        }
    }

    /// Admin action that opens the balance payment. Only approved bookings
    /// with money still owing qualify.
    #[tracing::instrument]
    pub fn request_final_payment(&mut self, session_id: &str, url: &str) -> Result<(), Error> {
        match self.status {
            Status::Approved => {
                self.status = Status::AwaitingFinalPayment;
                self.final_payment_url = Some(url.into());
                self.checkout_session_id = Some(session_id.into());
                self.touch();
                Ok(())
            }
            _ => Err(invalid_state_error(format!(
                "final payment cannot be requested for a {} booking",
                self.status.name()
            ))),
        }
    }

    /// Balance confirmation from the payment provider. Accepted from
    /// `Approved` as well, in case the confirmation outruns the admin flow.
    #[tracing::instrument]
    pub fn apply_final_paid(
        &mut self,
        payment_reference: Option<&str>,
    ) -> Result<WebhookOutcome, Error> {
        if self.final_paid || self.status == Status::Completed {
            return Ok(WebhookOutcome::AlreadyApplied);
        }

        match self.status {
            Status::Approved | Status::AwaitingFinalPayment => {
                self.status = Status::Completed;
                self.final_paid = true;
                self.completed_at = Some(Utc::now());
                if let Some(reference) = payment_reference {
                    self.payment_reference = Some(reference.into());
                }
                self.touch();
                Ok(WebhookOutcome::Applied)
            }
            _ => Err(invalid_state_error(format!(
                "final payment arrived for a {} booking",
                self.status.name()
            ))),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Corridor;

    fn booking() -> Booking {
        let quote = Quote::route_based(
            ServiceType::AirportTransfer,
            Corridor::YycToCanmore,
            518.44,
            0.35,
        );

        Booking::new(
            Uuid::new_v4(),
            ServiceType::AirportTransfer,
            VehicleClass::LuxurySuv,
            Location::new("Calgary Airport (YYC)", None),
            Location::new("Solara, Canmore", None),
            Utc::now() + chrono::Duration::days(7),
            None,
            Vec::new(),
            &quote,
        )
    }

    #[test]
    fn new_bookings_start_pending_and_unpaid() {
        let booking = booking();

        assert_eq!(booking.status, Status::Pending);
        assert!(!booking.deposit_paid);
        assert!(!booking.final_paid);
        assert_eq!(booking.total_price, 518.44);
        assert_eq!(booking.deposit_amount, 181.45);
    }

    #[test]
    fn wedding_bookings_get_default_event_times() {
        let quote = Quote::hourly(ServiceType::WeddingShuttle, 850.0, 42.5, 892.5, 0.5);
        let booking = Booking::new(
            Uuid::new_v4(),
            ServiceType::WeddingShuttle,
            VehicleClass::TransitVan,
            Location::new("Silvertip Resort", None),
            Location::new("The Malcom Hotel", None),
            Utc::now(),
            None,
            Vec::new(),
            &quote,
        );

        let event = booking.event.expect("wedding bookings carry event details");
        assert_eq!(event.start_time.as_deref(), Some("22:00"));
        assert_eq!(event.end_time.as_deref(), Some("02:00"));
    }

    #[test]
    fn only_pending_bookings_can_be_cancelled() {
        let mut pending = booking();
        assert!(pending.cancel().is_ok());
        assert_eq!(pending.status, Status::Cancelled);

        let mut approved = booking();
        approved.apply_deposit_paid(None).unwrap();
        assert!(approved.cancel().is_err());
        assert_eq!(approved.status, Status::Approved);

        let mut awaiting = booking();
        awaiting.apply_deposit_paid(None).unwrap();
        awaiting
            .request_final_payment("cs_1", "https://pay.test/cs_1")
            .unwrap();
        assert!(awaiting.cancel().is_err());
        assert_eq!(awaiting.status, Status::AwaitingFinalPayment);

        let mut completed = booking();
        completed.apply_deposit_paid(None).unwrap();
        completed.apply_final_paid(None).unwrap();
        assert!(completed.cancel().is_err());

        let mut cancelled = booking();
        cancelled.cancel().unwrap();
        assert!(cancelled.cancel().is_err());
    }

    #[test]
    fn deposit_confirmation_approves_a_pending_booking() {
        let mut booking = booking();

        let outcome = booking.apply_deposit_paid(Some("pi_123")).unwrap();

        assert_eq!(outcome, WebhookOutcome::Applied);
        assert_eq!(booking.status, Status::Approved);
        assert!(booking.deposit_paid);
        assert_eq!(booking.payment_reference.as_deref(), Some("pi_123"));
    }

    #[test]
    fn replayed_deposit_confirmation_is_a_no_op() {
        let mut booking = booking();
        booking.apply_deposit_paid(Some("pi_123")).unwrap();
        let updated_at = booking.updated_at;

        let outcome = booking.apply_deposit_paid(Some("pi_456")).unwrap();

        assert_eq!(outcome, WebhookOutcome::AlreadyApplied);
        assert_eq!(booking.status, Status::Approved);
        assert_eq!(booking.payment_reference.as_deref(), Some("pi_123"));
        assert_eq!(booking.updated_at, updated_at);
    }

    #[test]
    fn deposit_confirmation_for_a_cancelled_booking_is_rejected() {
        let mut booking = booking();
        booking.cancel().unwrap();

        let err = booking.apply_deposit_paid(None).unwrap_err();

        assert_eq!(err.code, crate::error::INVALID_STATE);
        assert_eq!(booking.status, Status::Cancelled);
        assert!(!booking.deposit_paid);
    }

    #[test]
    fn final_payment_request_needs_an_approved_booking() {
        let mut pending = booking();
        assert!(pending
            .request_final_payment("cs_1", "https://pay.test/cs_1")
            .is_err());

        let mut approved = booking();
        approved.apply_deposit_paid(None).unwrap();
        approved
            .request_final_payment("cs_1", "https://pay.test/cs_1")
            .unwrap();

        assert_eq!(approved.status, Status::AwaitingFinalPayment);
        assert_eq!(
            approved.final_payment_url.as_deref(),
            Some("https://pay.test/cs_1")
        );
    }

    #[test]
    fn final_confirmation_completes_from_either_paid_state() {
        let mut awaiting = booking();
        awaiting.apply_deposit_paid(None).unwrap();
        awaiting
            .request_final_payment("cs_1", "https://pay.test/cs_1")
            .unwrap();
        let outcome = awaiting.apply_final_paid(Some("pi_789")).unwrap();
        assert_eq!(outcome, WebhookOutcome::Applied);
        assert_eq!(awaiting.status, Status::Completed);
        assert!(awaiting.completed_at.is_some());

        // confirmation can outrun the admin request
        let mut approved = booking();
        approved.apply_deposit_paid(None).unwrap();
        let outcome = approved.apply_final_paid(None).unwrap();
        assert_eq!(outcome, WebhookOutcome::Applied);
        assert_eq!(approved.status, Status::Completed);
    }

    #[test]
    fn replayed_final_confirmation_is_a_no_op() {
        let mut booking = booking();
        booking.apply_deposit_paid(None).unwrap();
        booking.apply_final_paid(Some("pi_789")).unwrap();

        let outcome = booking.apply_final_paid(Some("pi_999")).unwrap();

        assert_eq!(outcome, WebhookOutcome::AlreadyApplied);
        assert_eq!(booking.payment_reference.as_deref(), Some("pi_789"));
    }

    #[test]
    fn final_confirmation_for_an_unpaid_booking_is_rejected() {
        let mut pending = booking();
        assert!(pending.apply_final_paid(None).is_err());

        let mut cancelled = booking();
        cancelled.cancel().unwrap();
        assert!(cancelled.apply_final_paid(None).is_err());
    }

    #[test]
    fn add_on_duration_must_stay_inside_the_catalog_bounds() {
        let request = AddOnRequest {
            service: AddOnService::CeremonyPickupDropoff,
            duration_hours: Some(2),
            location: Some("Cornerstone Theatre".into()),
            notes: None,
        };
        let add_on = AddOn::from_request(&request).unwrap();
        assert_eq!(add_on.price, 750.0);

        let too_long = AddOnRequest {
            duration_hours: Some(4),
            ..request.clone()
        };
        assert!(AddOn::from_request(&too_long).is_err());

        let zero = AddOnRequest {
            duration_hours: Some(0),
            ..request
        };
        assert!(AddOn::from_request(&zero).is_err());
    }

    #[test]
    fn status_names_match_the_stored_column_values() {
        assert_eq!(Status::Pending.name(), "Pending");
        assert_eq!(Status::Approved.name(), "Approved");
        assert_eq!(Status::AwaitingFinalPayment.name(), "AwaitingFinalPayment");
        assert_eq!(Status::Completed.name(), "Completed");
        assert_eq!(Status::Cancelled.name(), "Cancelled");

        assert!(!Status::Pending.is_terminal());
        assert!(!Status::Approved.is_terminal());
        assert!(!Status::AwaitingFinalPayment.is_terminal());
        assert!(Status::Completed.is_terminal());
        assert!(Status::Cancelled.is_terminal());
    }
}
