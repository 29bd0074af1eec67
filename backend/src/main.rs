//! Service entry-point: loads settings, builds the shared pools and serves
//! the REST API.

mod server;

use std::io;

use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, create_server};
use social_backend::AppSettings;
use social_backend::outbound::cache::{RedisConfig, RedisPool};
use social_backend::outbound::persistence::{DbPool, PoolConfig};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|e| io::Error::other(e.to_string()))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let db_pool = DbPool::new(
        PoolConfig::new(settings.database_url())
            .with_max_size(settings.db_max_connections())
            .with_min_idle(Some(settings.db_min_idle()))
            .with_connection_timeout(settings.db_connect_timeout())
            .with_idle_timeout(Some(settings.db_idle_timeout()))
            .with_max_lifetime(Some(settings.db_max_lifetime()))
            .with_query_timeout(settings.query_timeout()),
    )
    .await
    .map_err(|e| io::Error::other(format!("database pool: {e}")))?;

    let mut config = ServerConfig::new(settings.clone(), bind_addr, db_pool);
    if settings.cache_enabled() || settings.rate_limit_enabled() {
        let redis = RedisConfig::new(settings.redis_url())
            .with_max_size(settings.redis_max_connections())
            .with_round_trip_timeout(settings.round_trip_timeout());
        match RedisPool::new(redis) {
            Ok(pool) => config = config.with_redis_pool(pool),
            Err(e) => warn!(error = %e, "redis unavailable; cache and rate limiter disabled"),
        }
    }

    let (health_state, server) = create_server(config)?;
    info!(%bind_addr, "listening");
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
