use axum::body::Bytes;
use axum::extract::{Extension, Json};
use axum::http::HeaderMap;
use serde_json::{json, Value};

use crate::error::Error;
use crate::external::stripe;
use crate::server::DynAPI;

#[axum_macros::debug_handler]
pub async fn webhook(
    Extension(api): Extension<DynAPI>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, Error> {
    let signature = headers
        .get(stripe::SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    api.process_webhook(&body, signature).await?;

    Ok(Json(json!({ "received": true })))
}
