mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{HeaderMap, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use uuid::Uuid;

use crate::server::handlers::{admin, bookings, payments, quotes};
use crate::{
    api::API,
    auth::User,
    error::{unauthenticated_error, Error},
};

type DynAPI = Arc<dyn API + Send + Sync>;

pub async fn serve<T: API + Sync + Send + 'static>(api: T, port: u16) {
    let api = Arc::new(api) as DynAPI;

    let app = Router::new()
        .route("/quotes/estimate", post(quotes::estimate))
        .route("/quotes/distance", get(quotes::estimate_distance))
        .route("/bookings", post(bookings::create))
        .route("/bookings/active", get(bookings::active))
        .route("/bookings/history", get(bookings::history))
        .route("/bookings/:id", get(bookings::find))
        .route("/bookings/:id/cancel", patch(bookings::cancel))
        .route(
            "/bookings/:id/continue-payment",
            post(bookings::continue_payment),
        )
        .route("/admin/bookings", get(admin::list))
        .route(
            "/admin/bookings/:id/final-payment",
            post(admin::request_final_payment),
        )
        .route_layer(middleware::from_fn(identity))
        .route("/payments/webhook", post(payments::webhook))
        .route("/health", get(handlers::health))
        .layer(Extension(api));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}

/// Trusts the identity headers stamped by the gateway in front of this
/// service. The webhook and health routes stay outside this layer.
async fn identity<B: Send>(mut request: Request<B>, next: Next<B>) -> Result<Response, Error> {
    let user = user_from_headers(request.headers()).ok_or_else(unauthenticated_error)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

fn user_from_headers(headers: &HeaderMap) -> Option<User> {
    let id = headers
        .get("x-user-id")?
        .to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value).ok())?;

    let roles = match headers
        .get("x-user-roles")
        .and_then(|value| value.to_str().ok())
    {
        Some(value) => value
            .split(',')
            .map(|role| role.trim().to_lowercase())
            .filter(|role| !role.is_empty())
            .collect(),
        None => vec!["customer".into()],
    };

    Some(User { id, roles })
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::HeaderValue;

    #[test]
    fn reads_identity_headers() {
        let id = Uuid::new_v4();

        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_str(&id.to_string()).unwrap());
        headers.insert("x-user-roles", HeaderValue::from_static("Admin, customer"));

        let user = user_from_headers(&headers).unwrap();

        assert_eq!(user.id, id);
        assert_eq!(user.roles, vec!["admin".to_string(), "customer".to_string()]);
    }

    #[test]
    fn missing_or_malformed_id_yields_no_user() {
        assert!(user_from_headers(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("not-a-uuid"));
        assert!(user_from_headers(&headers).is_none());
    }

    #[test]
    fn role_header_defaults_to_customer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-user-id",
            HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
        );

        let user = user_from_headers(&headers).unwrap();

        assert_eq!(user.roles, vec!["customer".to_string()]);
    }
}
