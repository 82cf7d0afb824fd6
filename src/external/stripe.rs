use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{invalid_input_error, signature_invalid_error, upstream_error, Error},
};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentPurpose {
    Deposit,
    Final,
}

impl PaymentPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Final => "final",
        }
    }

    /// Sessions created before the purpose tag existed carry no marker and
    /// are treated as deposits.
    pub fn from_metadata(value: Option<&str>) -> Self {
        match value {
            Some("final") => Self::Final,
            _ => Self::Deposit,
        }
    }
}

/// What the engine wants a checkout session for. Amounts are in the
/// configured currency's major unit.
#[derive(Clone, Debug)]
pub struct SessionRequest {
    pub amount: f64,
    pub product_name: String,
    pub description: String,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub purpose: PaymentPurpose,
}

#[derive(Clone, Debug)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: CheckoutSessionObject,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub metadata: SessionMetadata,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SessionMetadata {
    #[serde(rename = "bookingId")]
    pub booking_id: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "paymentType")]
    pub payment_type: Option<String>,
}

impl SessionMetadata {
    pub fn purpose(&self) -> PaymentPurpose {
        PaymentPurpose::from_metadata(self.payment_type.as_deref())
    }
}

#[derive(Clone, Debug)]
pub struct Checkout {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
    webhook_secret: String,
    success_url: String,
    cancel_url: String,
    currency: String,
    webhook_tolerance: Duration,
}

impl Checkout {
    pub fn new(config: &AppConfig, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_base: config.stripe_api_base.clone(),
            secret_key: config.stripe_secret_key.clone(),
            webhook_secret: config.stripe_webhook_secret.clone(),
            success_url: config.checkout_success_url.clone(),
            cancel_url: config.checkout_cancel_url.clone(),
            currency: config.currency.clone(),
            webhook_tolerance: Duration::from_secs(config.webhook_tolerance_secs),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_session(&self, request: SessionRequest) -> Result<CheckoutSession, Error> {
        let amount_cents = (request.amount * 100.0).round() as i64;

        if amount_cents <= 0 {
            return Err(invalid_input_error("payment amount must be positive"));
        }

        let form: Vec<(&str, String)> = vec![
            ("mode", "payment".into()),
            ("payment_method_types[0]", "card".into()),
            ("line_items[0][quantity]", "1".into()),
            ("line_items[0][price_data][currency]", self.currency.clone()),
            (
                "line_items[0][price_data][unit_amount]",
                amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                request.product_name,
            ),
            (
                "line_items[0][price_data][product_data][description]",
                request.description,
            ),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
            ("client_reference_id", request.booking_id.to_string()),
            ("metadata[bookingId]", request.booking_id.to_string()),
            ("metadata[userId]", request.customer_id.to_string()),
            ("metadata[paymentType]", request.purpose.as_str().into()),
        ];

        let res = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code != 200 {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(status_code, %body, "checkout session was not created");
            return Err(upstream_error());
        }

        let session: SessionResponse = res.json().await?;
        let url = session.url.ok_or_else(upstream_error)?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    /// Verifies the provider signature and parses the event. Anything that
    /// fails verification is rejected before the payload is looked at.
    pub fn construct_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, Error> {
        verify_signature(
            payload,
            signature_header,
            self.webhook_secret.as_bytes(),
            self.webhook_tolerance,
            Utc::now().timestamp(),
        )?;

        serde_json::from_slice(payload).map_err(|err| {
            tracing::warn!(%err, "signed webhook payload failed to parse");
            invalid_input_error("malformed webhook payload")
        })
    }
}

/// Checks a `t=<unix>,v1=<hex>` header against HMAC-SHA256 over
/// `"{t}.{payload}"`. Any one valid `v1` candidate within the timestamp
/// tolerance passes.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &[u8],
    tolerance: Duration,
    now_unix: i64,
) -> Result<(), Error> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = match timestamp {
        Some(timestamp) => timestamp,
        None => return Err(signature_invalid_error()),
    };

    if candidates.is_empty() {
        return Err(signature_invalid_error());
    }

    if (now_unix - timestamp).unsigned_abs() > tolerance.as_secs() {
        return Err(signature_invalid_error());
    }

    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| signature_invalid_error())?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    for candidate in candidates {
        if let Ok(decoded) = hex::decode(candidate) {
            if mac.clone().verify_slice(&decoded).is_ok() {
                return Ok(());
            }
        }
    }

    Err(signature_invalid_error())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"whsec_test_secret";

    fn sign(payload: &[u8], secret: &[u8], timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        format!(
            "t={},v1={}",
            timestamp,
            hex::encode(mac.finalize().into_bytes())
        )
    }

    #[test]
    fn accepts_a_correctly_signed_payload() {
        let payload = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;
        let header = sign(payload, SECRET, 1_700_000_000);

        let verified = verify_signature(
            payload,
            &header,
            SECRET,
            Duration::from_secs(300),
            1_700_000_010,
        );

        assert!(verified.is_ok());
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let payload = br#"{"id":"evt_1","amount":100}"#;
        let header = sign(payload, SECRET, 1_700_000_000);

        let tampered = br#"{"id":"evt_1","amount":900}"#;
        let verified = verify_signature(
            tampered,
            &header,
            SECRET,
            Duration::from_secs(300),
            1_700_000_010,
        );

        assert_eq!(verified.unwrap_err().code, crate::error::SIGNATURE_INVALID);
    }

    #[test]
    fn rejects_the_wrong_secret() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(payload, b"whsec_other", 1_700_000_000);

        let verified = verify_signature(
            payload,
            &header,
            SECRET,
            Duration::from_secs(300),
            1_700_000_010,
        );

        assert!(verified.is_err());
    }

    #[test]
    fn rejects_a_stale_timestamp() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(payload, SECRET, 1_700_000_000);

        let verified = verify_signature(
            payload,
            &header,
            SECRET,
            Duration::from_secs(300),
            1_700_000_301,
        );

        assert_eq!(verified.unwrap_err().code, crate::error::SIGNATURE_INVALID);
    }

    #[test]
    fn accepts_timestamps_inside_the_tolerance_in_both_directions() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(payload, SECRET, 1_700_000_000);

        assert!(verify_signature(payload, &header, SECRET, Duration::from_secs(300), 1_700_000_300).is_ok());
        assert!(verify_signature(payload, &header, SECRET, Duration::from_secs(300), 1_699_999_700).is_ok());
    }

    #[test]
    fn rejects_garbage_headers() {
        let payload = br#"{"id":"evt_1"}"#;
        let tolerance = Duration::from_secs(300);

        assert!(verify_signature(payload, "", SECRET, tolerance, 0).is_err());
        assert!(verify_signature(payload, "t=abc,v1=zz", SECRET, tolerance, 0).is_err());
        assert!(verify_signature(payload, "v1=deadbeef", SECRET, tolerance, 0).is_err());
        assert!(verify_signature(payload, "t=100", SECRET, tolerance, 100).is_err());
        assert!(verify_signature(payload, "t=100,v1=nothex", SECRET, tolerance, 100).is_err());
    }

    #[test]
    fn any_valid_candidate_among_several_passes() {
        let payload = br#"{"id":"evt_1"}"#;
        let good = sign(payload, SECRET, 1_700_000_000);
        let real_sig = good.rsplit("v1=").next().unwrap();

        // bogus candidate first, real one second
        let header = format!("t=1700000000,v1=deadbeef,v1={}", real_sig);
        let verified = verify_signature(
            payload,
            &header,
            SECRET,
            Duration::from_secs(300),
            1_700_000_000,
        );

        assert!(verified.is_ok());
    }

    #[test]
    fn parses_a_checkout_completed_event() {
        let payload = r#"{
            "id": "evt_1A2b3C",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_123",
                    "payment_intent": "pi_987",
                    "metadata": {
                        "bookingId": "7f8a1d44-3c21-4e9a-9d2b-5f6a7b8c9d0e",
                        "userId": "1f2e3d4c-5b6a-4789-8abc-def012345678",
                        "paymentType": "final"
                    }
                }
            }
        }"#;

        let event: WebhookEvent = serde_json::from_str(payload).unwrap();

        assert_eq!(event.event_type, CHECKOUT_SESSION_COMPLETED);
        assert_eq!(event.data.object.id, "cs_test_123");
        assert_eq!(event.data.object.payment_intent.as_deref(), Some("pi_987"));
        assert_eq!(event.data.object.metadata.purpose(), PaymentPurpose::Final);
        assert_eq!(
            event.data.object.metadata.booking_id.as_deref(),
            Some("7f8a1d44-3c21-4e9a-9d2b-5f6a7b8c9d0e")
        );
    }

    #[test]
    fn missing_metadata_defaults_to_a_deposit() {
        let payload = r#"{
            "id": "evt_2",
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_test_456", "payment_intent": null } }
        }"#;

        let event: WebhookEvent = serde_json::from_str(payload).unwrap();

        assert_eq!(event.data.object.metadata.purpose(), PaymentPurpose::Deposit);
        assert!(event.data.object.metadata.booking_id.is_none());
    }
}
