//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use social_backend::AppSettings;
use social_backend::outbound::cache::RedisPool;
use social_backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) redis_pool: Option<RedisPool>,
    pub(crate) settings: AppSettings,
}

impl ServerConfig {
    /// Construct a server configuration around the shared database pool.
    #[must_use]
    pub fn new(settings: AppSettings, bind_addr: SocketAddr, db_pool: DbPool) -> Self {
        Self {
            bind_addr,
            db_pool,
            redis_pool: None,
            settings,
        }
    }

    /// Attach the Redis pool backing the entity cache and the rate limiter.
    ///
    /// Without a pool the cache is disabled and the limiter admits everything.
    #[must_use]
    pub fn with_redis_pool(mut self, pool: RedisPool) -> Self {
        self.redis_pool = Some(pool);
        self
    }
}
