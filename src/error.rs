use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::Debug;

// Codes below 100 are internal faults and are never explained to callers.
pub const ENV_VAR: i32 = 1;
pub const DATABASE: i32 = 2;
pub const REQWEST: i32 = 3;
pub const UPSTREAM: i32 = 4;
pub const UNEXPECTED: i32 = 5;
pub const POLICY: i32 = 6;

pub const INVALID_STATE: i32 = 100;
pub const INVALID_INPUT: i32 = 101;
pub const NOT_FOUND: i32 = 102;
pub const UNAUTHENTICATED: i32 = 103;
pub const UNAUTHORIZED: i32 = 104;
pub const CONFLICT_ACTIVE_BOOKING: i32 = 110;
pub const CONFLICT_VEHICLE_UNAVAILABLE: i32 = 111;
pub const UNPRICEABLE_ROUTE: i32 = 120;
pub const INVALID_DISTANCE: i32 = 121;
pub const DISTANCE_UNAVAILABLE: i32 = 122;
pub const NO_REMAINING_BALANCE: i32 = 130;
pub const SIGNATURE_INVALID: i32 = 131;

#[derive(Clone, Debug)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        database_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        policy_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.code {
            1..=99 => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            NOT_FOUND => (StatusCode::NOT_FOUND, self.message.as_str()),
            UNAUTHENTICATED => (StatusCode::UNAUTHORIZED, self.message.as_str()),
            UNAUTHORIZED => (StatusCode::FORBIDDEN, self.message.as_str()),
            INVALID_STATE | CONFLICT_ACTIVE_BOOKING | CONFLICT_VEHICLE_UNAVAILABLE => {
                (StatusCode::CONFLICT, self.message.as_str())
            }
            UNPRICEABLE_ROUTE | INVALID_DISTANCE => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.message.as_str())
            }
            DISTANCE_UNAVAILABLE => (StatusCode::SERVICE_UNAVAILABLE, self.message.as_str()),
            _ => (StatusCode::BAD_REQUEST, self.message.as_str()),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn invalid_state_error(message: impl Into<String>) -> Error {
    Error {
        code: INVALID_STATE,
        message: message.into(),
    }
}

pub fn invalid_input_error(message: impl Into<String>) -> Error {
    Error {
        code: INVALID_INPUT,
        message: message.into(),
    }
}

pub fn not_found_error() -> Error {
    Error {
        code: NOT_FOUND,
        message: "resource not found".into(),
    }
}

pub fn unauthenticated_error() -> Error {
    Error {
        code: UNAUTHENTICATED,
        message: "authentication required".into(),
    }
}

pub fn unauthorized_error() -> Error {
    Error {
        code: UNAUTHORIZED,
        message: "unauthorized".into(),
    }
}

pub fn conflict_active_booking_error() -> Error {
    Error {
        code: CONFLICT_ACTIVE_BOOKING,
        message: "You already have an active booking.".into(),
    }
}

pub fn conflict_vehicle_unavailable_error(vehicle: &str) -> Error {
    Error {
        code: CONFLICT_VEHICLE_UNAVAILABLE,
        message: format!(
            "The {} is not available at this time. Please choose another slot.",
            vehicle
        ),
    }
}

pub fn unpriceable_route_error() -> Error {
    Error {
        code: UNPRICEABLE_ROUTE,
        message: "Unable to price this route. Please select locations from the suggestions list."
            .into(),
    }
}

pub fn invalid_distance_error(distance_km: f64, max_distance_km: f64) -> Error {
    Error {
        code: INVALID_DISTANCE,
        message: format!(
            "Distance {:.1} km exceeds the maximum supported {:.0} km.",
            distance_km, max_distance_km
        ),
    }
}

pub fn distance_unavailable_error() -> Error {
    Error {
        code: DISTANCE_UNAVAILABLE,
        message: "Driving distance is currently unavailable.".into(),
    }
}

pub fn no_remaining_balance_error() -> Error {
    Error {
        code: NO_REMAINING_BALANCE,
        message: "No remaining balance to pay.".into(),
    }
}

pub fn signature_invalid_error() -> Error {
    Error {
        code: SIGNATURE_INVALID,
        message: "Webhook signature verification failed.".into(),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: ENV_VAR,
        message: "environment variable error".into(),
    }
}

pub fn database_error<T: Debug>(err: T) -> Error {
    tracing::error!(?err, "database error");

    Error {
        code: DATABASE,
        message: "database error".into(),
    }
}

pub fn reqwest_error(err: reqwest::Error) -> Error {
    tracing::error!(%err, "http request failed");

    Error {
        code: REQWEST,
        message: "reqwest error".into(),
    }
}

pub fn upstream_error() -> Error {
    Error {
        code: UPSTREAM,
        message: "upstream error".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: UNEXPECTED,
        message: "unexpected error".into(),
    }
}

pub fn policy_error(err: oso::OsoError) -> Error {
    tracing::error!(%err, "authorization policy error");

    Error {
        code: POLICY,
        message: "authorization policy error".into(),
    }
}
