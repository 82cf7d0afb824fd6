use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::distance::DistanceResult;
use crate::entities::{
    AddOnRequest, Booking, Coordinates, EventDetails, Location, Quote, ServiceType, VehicleClass,
};
use crate::error::Error;

/// Everything needed to price a trip. Shared by the estimate endpoint and
/// booking creation so the two can never disagree on a price.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub service: ServiceType,
    pub vehicle: VehicleClass,
    pub pickup: Location,
    pub dropoff: Location,
    #[serde(default)]
    pub event: Option<EventDetails>,
    #[serde(default)]
    pub add_ons: Vec<AddOnRequest>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookingRequest {
    #[serde(flatten)]
    pub details: QuoteRequest,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRedirect {
    pub url: String,
}

#[async_trait]
pub trait QuoteAPI {
    async fn estimate_price(&self, user: User, request: QuoteRequest) -> Result<Quote, Error>;

    async fn estimate_distance(
        &self,
        user: User,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<DistanceResult, Error>;
}

#[async_trait]
pub trait BookingAPI {
    async fn create_booking(&self, user: User, request: BookingRequest) -> Result<Booking, Error>;

    async fn find_booking(&self, user: User, id: Uuid) -> Result<Booking, Error>;

    async fn active_booking(&self, user: User) -> Result<Option<Booking>, Error>;

    async fn booking_history(&self, user: User) -> Result<Vec<Booking>, Error>;

    async fn list_bookings(&self, user: User) -> Result<Vec<Booking>, Error>;

    async fn cancel_booking(&self, user: User, id: Uuid) -> Result<Booking, Error>;
}

#[async_trait]
pub trait PaymentAPI {
    async fn continue_payment(&self, user: User, id: Uuid) -> Result<CheckoutRedirect, Error>;

    async fn request_final_payment(&self, user: User, id: Uuid)
        -> Result<CheckoutRedirect, Error>;

    async fn process_webhook(&self, payload: &[u8], signature_header: &str) -> Result<(), Error>;
}

pub trait API: QuoteAPI + BookingAPI + PaymentAPI {}
