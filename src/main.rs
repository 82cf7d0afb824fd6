use switchback::config::AppConfig;
use switchback::db::PgPool;
use switchback::engine::Engine;
use switchback::server::serve;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = AppConfig::load();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    let PgPool(pool) = PgPool::new(&config.database_url, config.database_max_connections)
        .await
        .unwrap();

    let engine = Engine::new(pool, &config).await.unwrap();

    serve(engine, config.http_port).await;
}
