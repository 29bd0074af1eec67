//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `SOCIAL_*` environment variables and an
//! optional configuration file. Every field is optional; accessors supply
//! the defaults so call sites never hard-code a budget.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATABASE_URL: &str = "postgres://localhost/social";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 30;
const DEFAULT_DB_MIN_IDLE: u32 = 5;
const DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DB_IDLE_TIMEOUT_SECS: u64 = 15 * 60;
const DEFAULT_DB_MAX_LIFETIME_SECS: u64 = 30 * 60;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 15;
const DEFAULT_REDIS_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_ROUND_TRIP_TIMEOUT_SECS: u64 = 5;
const DEFAULT_RATE_LIMIT: u64 = 20;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
const DEFAULT_INVITATION_TTL_SECS: u64 = 5 * 60 * 60;

/// Runtime configuration for the service binary.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SOCIAL")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Minimum idle database connections kept warm.
    pub db_min_idle: Option<u32>,
    /// Seconds to wait for a pooled database connection.
    pub db_connect_timeout_secs: Option<u64>,
    /// Seconds an idle database connection may linger.
    pub db_idle_timeout_secs: Option<u64>,
    /// Seconds before a database connection is recycled.
    pub db_max_lifetime_secs: Option<u64>,
    /// Per-query deadline in seconds.
    pub query_timeout_secs: Option<u64>,
    /// Redis connection string shared by the cache and the limiter.
    pub redis_url: Option<String>,
    /// Maximum pooled Redis connections.
    pub redis_max_connections: Option<u32>,
    /// Enable the Redis entity cache. On unless set to `false`.
    pub cache_enabled: Option<bool>,
    /// Fail reads instead of falling through when the cache errors.
    #[ortho_config(default = false)]
    pub cache_fail_closed: bool,
    /// Entity cache TTL in seconds.
    pub cache_ttl_secs: Option<u64>,
    /// Upper bound for random TTL jitter in seconds.
    pub cache_ttl_jitter_secs: Option<u64>,
    /// Cache and limiter round-trip deadline in seconds.
    pub round_trip_timeout_secs: Option<u64>,
    /// Enable the fixed-window rate limiter. On unless set to `false`.
    pub rate_limit_enabled: Option<bool>,
    /// Requests allowed per window and client.
    pub rate_limit: Option<u64>,
    /// Rate limit window length in seconds.
    pub rate_limit_window_secs: Option<u64>,
    /// Key the limiter on `Forwarded`/`X-Forwarded-For`; set only behind a
    /// proxy that overwrites them.
    #[ortho_config(default = false)]
    pub trust_forwarded_headers: bool,
    /// Invitation expiry in seconds.
    pub invitation_ttl_secs: Option<u64>,
}

impl AppSettings {
    /// Resolve the bind address.
    ///
    /// # Errors
    /// Returns [`std::net::AddrParseError`] when the configured value is not a
    /// socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
    }

    pub fn database_url(&self) -> &str {
        self.database_url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    pub fn db_min_idle(&self) -> u32 {
        self.db_min_idle.unwrap_or(DEFAULT_DB_MIN_IDLE)
    }

    pub fn db_connect_timeout(&self) -> Duration {
        secs(self.db_connect_timeout_secs, DEFAULT_DB_CONNECT_TIMEOUT_SECS)
    }

    pub fn db_idle_timeout(&self) -> Duration {
        secs(self.db_idle_timeout_secs, DEFAULT_DB_IDLE_TIMEOUT_SECS)
    }

    pub fn db_max_lifetime(&self) -> Duration {
        secs(self.db_max_lifetime_secs, DEFAULT_DB_MAX_LIFETIME_SECS)
    }

    pub fn query_timeout(&self) -> Duration {
        secs(self.query_timeout_secs, DEFAULT_QUERY_TIMEOUT_SECS)
    }

    pub fn redis_url(&self) -> &str {
        self.redis_url.as_deref().unwrap_or(DEFAULT_REDIS_URL)
    }

    pub fn redis_max_connections(&self) -> u32 {
        self.redis_max_connections
            .unwrap_or(DEFAULT_REDIS_MAX_CONNECTIONS)
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled.unwrap_or(true)
    }

    pub fn cache_ttl(&self) -> Duration {
        secs(self.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS)
    }

    /// Jitter is off unless configured.
    pub fn cache_ttl_jitter(&self) -> Duration {
        secs(self.cache_ttl_jitter_secs, 0)
    }

    pub fn round_trip_timeout(&self) -> Duration {
        secs(self.round_trip_timeout_secs, DEFAULT_ROUND_TRIP_TIMEOUT_SECS)
    }

    pub fn rate_limit_enabled(&self) -> bool {
        self.rate_limit_enabled.unwrap_or(true)
    }

    pub fn rate_limit(&self) -> u64 {
        self.rate_limit.unwrap_or(DEFAULT_RATE_LIMIT)
    }

    pub fn rate_limit_window(&self) -> Duration {
        secs(self.rate_limit_window_secs, DEFAULT_RATE_LIMIT_WINDOW_SECS)
    }

    pub fn invitation_ttl(&self) -> Duration {
        secs(self.invitation_ttl_secs, DEFAULT_INVITATION_TTL_SECS)
    }
}

fn secs(value: Option<u64>, default: u64) -> Duration {
    Duration::from_secs(value.unwrap_or(default))
}
