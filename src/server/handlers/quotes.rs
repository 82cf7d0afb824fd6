use axum::extract::{Extension, Json, Query};
use serde::{Deserialize, Serialize};

use crate::api::QuoteRequest;
use crate::auth::User;
use crate::distance::DistanceResult;
use crate::entities::{Coordinates, Quote};
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct DistanceParams {
    from_lat: f64,
    from_lng: f64,
    to_lat: f64,
    to_lng: f64,
}

pub async fn estimate(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<Quote>, Error> {
    let quote = api.estimate_price(user, request).await?;

    Ok(quote.into())
}

pub async fn estimate_distance(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Query(params): Query<DistanceParams>,
) -> Result<Json<DistanceResult>, Error> {
    let origin = Coordinates::new(params.from_lat, params.from_lng);
    let destination = Coordinates::new(params.to_lat, params.to_lng);

    let result = api.estimate_distance(user, origin, destination).await?;

    Ok(result.into())
}
