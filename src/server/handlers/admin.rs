use axum::extract::{Extension, Json, Path};
use uuid::Uuid;

use crate::api::CheckoutRedirect;
use crate::auth::User;
use crate::entities::Booking;
use crate::error::Error;
use crate::server::DynAPI;

pub async fn list(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Booking>>, Error> {
    let bookings = api.list_bookings(user).await?;

    Ok(bookings.into())
}

pub async fn request_final_payment(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutRedirect>, Error> {
    let redirect = api.request_final_payment(user, id).await?;

    Ok(redirect.into())
}
