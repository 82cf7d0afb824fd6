mod booking_api;
mod helpers;
mod payment_api;
mod quote_api;

use std::sync::Arc;
use std::time::Duration;

use oso::Oso;
use sqlx::{Executor, Pool, Postgres};

use crate::{
    api::API,
    auth::authorizor,
    classifier::{HeuristicRouteResolver, RouteResolver},
    config::AppConfig,
    distance::{DistanceCache, DistanceResolver, InMemoryDistanceCache},
    error::{unauthorized_error, Error},
    external::{google_maps::GoogleMaps, stripe},
    pricing::DepositSchedule,
};

type Database = Postgres;

pub struct Engine {
    pool: Pool<Database>,
    authorizor: Oso,
    payments: stripe::Checkout,
    resolver: DistanceResolver,
    classifier: Arc<dyn RouteResolver>,
    deposits: DepositSchedule,
    max_distance_km: f64,
    vehicle_conflict_window: chrono::Duration,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub async fn new(pool: Pool<Database>, config: &AppConfig) -> Result<Self, Error> {
        // TODO: move schema bootstrap to sqlx migrations
        pool.execute(
            "CREATE TABLE IF NOT EXISTS bookings (
                id UUID PRIMARY KEY,
                customer_id UUID NOT NULL,
                vehicle VARCHAR NOT NULL,
                status VARCHAR NOT NULL,
                scheduled_at TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                data JSONB NOT NULL
            )",
        )
        .await?;

        // one live booking per customer, enforced even if two creates race
        pool.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS bookings_active_customer_idx
             ON bookings (customer_id)
             WHERE status IN ('Pending', 'Approved', 'AwaitingFinalPayment')",
        )
        .await?;

        pool.execute(
            "CREATE INDEX IF NOT EXISTS bookings_vehicle_schedule_idx
             ON bookings (vehicle, scheduled_at)",
        )
        .await?;

        // fleet rows double as row locks for booking creation
        pool.execute("CREATE TABLE IF NOT EXISTS vehicles (name VARCHAR PRIMARY KEY)")
            .await?;
        pool.execute(
            "INSERT INTO vehicles (name) VALUES ('LUXURY_SUV'), ('TRANSIT_VAN')
             ON CONFLICT (name) DO NOTHING",
        )
        .await?;

        let timeout = Duration::from_secs(config.http_client_timeout_secs);

        let routing = GoogleMaps::new(
            config.google_maps_api_base.clone(),
            config.google_maps_api_key.clone(),
            timeout,
        )?;
        let cache = Arc::new(InMemoryDistanceCache::new(Duration::from_secs(
            config.distance_cache_ttl_secs,
        )));
        let resolver =
            DistanceResolver::new(Arc::new(routing), cache.clone(), config.max_distance_km);

        tokio::spawn({
            let cache = cache.clone();
            async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(3600));
                loop {
                    ticker.tick().await;
                    let dropped = cache.purge_expired();
                    if dropped > 0 {
                        tracing::debug!(dropped, "expired distance cache entries dropped");
                    }
                }
            }
        });

        let payments = stripe::Checkout::new(config, timeout)?;

        Ok(Self {
            pool,
            authorizor: authorizor::new(),
            payments,
            resolver,
            classifier: Arc::new(HeuristicRouteResolver),
            deposits: config.deposit_schedule.clone(),
            max_distance_km: config.max_distance_km,
            vehicle_conflict_window: chrono::Duration::hours(config.vehicle_conflict_window_hours),
        })
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(unauthorized_error())
    }
}

impl API for Engine {}
