use axum::extract::{Extension, Json, Path};
use uuid::Uuid;

use crate::api::{BookingRequest, CheckoutRedirect};
use crate::auth::User;
use crate::entities::Booking;
use crate::error::Error;
use crate::server::DynAPI;

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<Booking>, Error> {
    let booking = api.create_booking(user, request).await?;

    Ok(booking.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, Error> {
    let booking = api.find_booking(user, id).await?;

    Ok(booking.into())
}

pub async fn active(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
) -> Result<Json<Option<Booking>>, Error> {
    let booking = api.active_booking(user).await?;

    Ok(booking.into())
}

pub async fn history(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Booking>>, Error> {
    let bookings = api.booking_history(user).await?;

    Ok(bookings.into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, Error> {
    let booking = api.cancel_booking(user, id).await?;

    Ok(booking.into())
}

pub async fn continue_payment(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutRedirect>, Error> {
    let redirect = api.continue_payment(user, id).await?;

    Ok(redirect.into())
}
