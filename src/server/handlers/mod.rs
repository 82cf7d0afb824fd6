pub mod admin;
pub mod bookings;
pub mod payments;
pub mod quotes;

use axum::extract::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
