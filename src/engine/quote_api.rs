use super::Engine;

use async_trait::async_trait;

use crate::{
    api::{QuoteAPI, QuoteRequest},
    auth::{Platform, User},
    distance::{estimate_road_distance, DistanceResult},
    entities::{Coordinates, Quote, ServiceType},
    error::{invalid_input_error, unpriceable_route_error, Error, INVALID_DISTANCE},
    pricing::{
        airport_corridor_price, distance_based_price, hourly_event_price, wedding_shuttle_price,
        CEREMONY_SERVICE, ENGAGEMENT_SERVICE,
    },
};

#[async_trait]
impl QuoteAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn estimate_price(&self, user: User, request: QuoteRequest) -> Result<Quote, Error> {
        self.authorize(user, "estimate_price", Platform::default())?;

        self.quote_for_request(&request).await
    }

    #[tracing::instrument(skip(self))]
    async fn estimate_distance(
        &self,
        user: User,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<DistanceResult, Error> {
        self.authorize(user, "estimate_price", Platform::default())?;

        if !origin.is_valid() || !destination.is_valid() {
            return Err(invalid_input_error("coordinates are out of range"));
        }

        Ok(estimate_road_distance(&origin, &destination))
    }
}

impl Engine {
    /// Prices a request without touching any booking state. Shared by the
    /// public estimate endpoint and booking creation.
    pub(super) async fn quote_for_request(&self, request: &QuoteRequest) -> Result<Quote, Error> {
        let deposit_rate = self.deposits.rate_for(request.service);

        match request.service {
            ServiceType::AirportTransfer => {
                self.quote_airport_transfer(request, deposit_rate).await
            }
            ServiceType::WeddingShuttle => {
                let additional_hours = request
                    .event
                    .as_ref()
                    .map_or(0, |event| event.additional_hours);
                let pricing =
                    wedding_shuttle_price(request.vehicle, additional_hours, &request.add_ons);

                Ok(Quote::hourly(
                    request.service,
                    pricing.subtotal,
                    pricing.gst,
                    pricing.total,
                    deposit_rate,
                ))
            }
            ServiceType::Engagement => {
                let hours = request.event.as_ref().map_or(0, |event| event.hours);
                let pricing = hourly_event_price(&ENGAGEMENT_SERVICE, request.vehicle, hours);

                Ok(Quote::hourly(
                    request.service,
                    pricing.subtotal,
                    pricing.gst,
                    pricing.total,
                    deposit_rate,
                ))
            }
            ServiceType::Ceremony => {
                let hours = request.event.as_ref().map_or(0, |event| event.hours);
                let pricing = hourly_event_price(&CEREMONY_SERVICE, request.vehicle, hours);

                Ok(Quote::hourly(
                    request.service,
                    pricing.subtotal,
                    pricing.gst,
                    pricing.total,
                    deposit_rate,
                ))
            }
        }
    }

    /// Airport transfers price off the measured driving distance when both
    /// pins are present, falling back to the corridor table when the
    /// measurement fails. A trip past the service ceiling never falls back.
    async fn quote_airport_transfer(
        &self,
        request: &QuoteRequest,
        deposit_rate: f64,
    ) -> Result<Quote, Error> {
        if let (Some(origin), Some(destination)) =
            (request.pickup.coordinates, request.dropoff.coordinates)
        {
            if !origin.is_valid() || !destination.is_valid() {
                return Err(invalid_input_error("coordinates are out of range"));
            }

            match self.resolver.resolve(&origin, &destination).await {
                Ok(distance) => {
                    let pricing = distance_based_price(
                        distance.distance_km,
                        request.vehicle,
                        self.max_distance_km,
                    )?;

                    return Ok(Quote::distance_based(
                        request.service,
                        distance.distance_km,
                        pricing.tier_breakdown,
                        pricing.total,
                        deposit_rate,
                    ));
                }
                Err(err) if err.code == INVALID_DISTANCE => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        code = err.code,
                        message = %err.message,
                        "distance resolution failed, falling back to the corridor table"
                    );
                }
            }
        }

        let corridor = self
            .classifier
            .resolve(&request.pickup.address, &request.dropoff.address)
            .ok_or_else(unpriceable_route_error)?;

        Ok(Quote::route_based(
            request.service,
            corridor,
            airport_corridor_price(corridor, request.vehicle),
            deposit_rate,
        ))
    }
}
