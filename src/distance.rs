use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;
use crate::error::{invalid_distance_error, invalid_input_error, Error};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Straight line to road distance correction for quick estimates.
pub const ROAD_ESTIMATE_MULTIPLIER: f64 = 1.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistanceMethod {
    Measured,
    Estimated,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistanceResult {
    pub distance_km: f64,
    pub duration_seconds: u32,
    pub method: DistanceMethod,
}

/// Upstream source of driving distances.
#[async_trait]
pub trait RoutingApi: Send + Sync {
    async fn driving_distance(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
    ) -> Result<DistanceResult, Error>;
}

pub trait DistanceCache: Send + Sync {
    fn get(&self, key: &str) -> Option<DistanceResult>;
    fn put(&self, key: String, result: DistanceResult);
    fn purge_expired(&self) -> usize;
}

struct CacheEntry {
    result: DistanceResult,
    stored_at: Instant,
}

/// Process local cache. Keys are coordinate pairs rounded to three decimal
/// places, roughly 111 metres, so nearby pins share an entry.
pub struct InMemoryDistanceCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl InMemoryDistanceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DistanceCache for InMemoryDistanceCache {
    fn get(&self, key: &str) -> Option<DistanceResult> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.result.clone())
            }
            Some(_) => true,
            None => false,
        };

        // the map guard is out of scope here, removal cannot deadlock
        if expired {
            self.entries.remove(key);
        }

        None
    }

    fn put(&self, key: String, result: DistanceResult) {
        self.entries.insert(
            key,
            CacheEntry {
                result,
                stored_at: Instant::now(),
            },
        );
    }

    fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        before - self.entries.len()
    }
}

pub fn cache_key(origin: &Coordinates, destination: &Coordinates) -> String {
    format!(
        "{:.3}_{:.3}_{:.3}_{:.3}",
        origin.lat, origin.lng, destination.lat, destination.lng
    )
}

pub fn haversine_km(origin: &Coordinates, destination: &Coordinates) -> f64 {
    let lat_delta = (destination.lat - origin.lat).to_radians();
    let lng_delta = (destination.lng - origin.lng).to_radians();

    let a = (lat_delta / 2.0).sin().powi(2)
        + origin.lat.to_radians().cos()
            * destination.lat.to_radians().cos()
            * (lng_delta / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Rough road distance for display while the user is still picking
/// locations. Never used for a chargeable price.
pub fn estimate_road_distance(origin: &Coordinates, destination: &Coordinates) -> DistanceResult {
    DistanceResult {
        distance_km: haversine_km(origin, destination) * ROAD_ESTIMATE_MULTIPLIER,
        duration_seconds: 0,
        method: DistanceMethod::Estimated,
    }
}

/// Caching front for the routing provider.
pub struct DistanceResolver {
    routing: Arc<dyn RoutingApi>,
    cache: Arc<dyn DistanceCache>,
    max_distance_km: f64,
}

impl DistanceResolver {
    pub fn new(
        routing: Arc<dyn RoutingApi>,
        cache: Arc<dyn DistanceCache>,
        max_distance_km: f64,
    ) -> Self {
        Self {
            routing,
            cache,
            max_distance_km,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn resolve(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
    ) -> Result<DistanceResult, Error> {
        if !origin.is_valid() || !destination.is_valid() {
            return Err(invalid_input_error("coordinates are out of range"));
        }

        let key = cache_key(origin, destination);

        if let Some(result) = self.cache.get(&key) {
            tracing::debug!(%key, "distance cache hit");
            return Ok(result);
        }

        let result = self.routing.driving_distance(origin, destination).await?;

        if result.distance_km > self.max_distance_km {
            return Err(invalid_distance_error(
                result.distance_km,
                self.max_distance_km,
            ));
        }

        self.cache.put(key, result.clone());

        Ok(result)
    }
}
