use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    distance::{DistanceMethod, DistanceResult, RoutingApi},
    entities::Coordinates,
    error::{distance_unavailable_error, invalid_input_error, upstream_error, Error},
};

#[derive(Clone, Debug)]
pub struct GoogleMaps {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GoogleMaps {
    pub fn new(api_base: String, api_key: String, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_base,
            api_key,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    rows: Vec<DistanceMatrixRow>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DistanceMatrixRow {
    elements: Vec<DistanceMatrixElement>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DistanceMatrixElement {
    status: String,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TextValue {
    text: String,
    value: u32,
}

/// Pulls the single origin to single destination leg out of a matrix
/// response. Distances come back in metres.
fn first_leg(response: DistanceMatrixResponse) -> Result<DistanceResult, Error> {
    if response.status != "OK" {
        tracing::warn!(status = %response.status, "distance matrix request not serviceable");
        return Err(distance_unavailable_error());
    }

    let element = response
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or_else(distance_unavailable_error)?;

    if element.status != "OK" {
        tracing::warn!(status = %element.status, "no route between the requested points");
        return Err(distance_unavailable_error());
    }

    let distance = element.distance.ok_or_else(distance_unavailable_error)?;
    let duration_seconds = element.duration.map(|d| d.value).unwrap_or(0);

    Ok(DistanceResult {
        distance_km: f64::from(distance.value) / 1000.0,
        duration_seconds,
        method: DistanceMethod::Measured,
    })
}

#[async_trait]
impl RoutingApi for GoogleMaps {
    #[tracing::instrument(skip(self))]
    async fn driving_distance(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
    ) -> Result<DistanceResult, Error> {
        let url = format!("https://{}/maps/api/distancematrix/json", self.api_base);

        let res = self
            .http
            .get(url)
            .query(&[("key", self.api_key.clone())])
            .query(&[("origins", String::from(*origin))])
            .query(&[("destinations", String::from(*destination))])
            .query(&[("units", "metric".to_string())])
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code >= 400 && status_code < 500 {
            return Err(invalid_input_error("distance matrix request rejected"));
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        let data: DistanceMatrixResponse = res.json().await?;

        first_leg(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_response(body: &str) -> DistanceMatrixResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn parses_a_successful_matrix_response() {
        let response = matrix_response(
            r#"{
                "status": "OK",
                "rows": [{
                    "elements": [{
                        "status": "OK",
                        "distance": { "text": "106 km", "value": 106000 },
                        "duration": { "text": "1 hour 23 mins", "value": 4980 }
                    }]
                }]
            }"#,
        );

        let result = first_leg(response).unwrap();

        assert_eq!(result.distance_km, 106.0);
        assert_eq!(result.duration_seconds, 4980);
        assert_eq!(result.method, DistanceMethod::Measured);
    }

    #[test]
    fn unroutable_elements_become_distance_unavailable() {
        let response = matrix_response(
            r#"{
                "status": "OK",
                "rows": [{
                    "elements": [{ "status": "ZERO_RESULTS" }]
                }]
            }"#,
        );

        let err = first_leg(response).unwrap_err();
        assert_eq!(err.code, crate::error::DISTANCE_UNAVAILABLE);
    }

    #[test]
    fn top_level_failures_become_distance_unavailable() {
        let denied = matrix_response(r#"{ "status": "REQUEST_DENIED", "rows": [] }"#);
        assert_eq!(
            first_leg(denied).unwrap_err().code,
            crate::error::DISTANCE_UNAVAILABLE
        );

        let empty = matrix_response(r#"{ "status": "OK", "rows": [] }"#);
        assert_eq!(
            first_leg(empty).unwrap_err().code,
            crate::error::DISTANCE_UNAVAILABLE
        );
    }

    #[test]
    fn metres_convert_to_kilometres() {
        let response = matrix_response(
            r#"{
                "status": "OK",
                "rows": [{
                    "elements": [{
                        "status": "OK",
                        "distance": { "text": "1.3 km", "value": 1284 },
                        "duration": { "text": "4 mins", "value": 240 }
                    }]
                }]
            }"#,
        );

        let result = first_leg(response).unwrap();
        assert!((result.distance_km - 1.284).abs() < 1e-9);
    }
}
