//! Shared `bb8-redis` pool.

use std::future::Future;
use std::time::Duration;

use bb8_redis::bb8::{Pool, PooledConnection};
use bb8_redis::{RedisConnectionManager, redis};

/// Default deadline for a single cache or counter round trip.
pub const DEFAULT_ROUND_TRIP_TIMEOUT: Duration = Duration::from_secs(5);

/// Pooled Redis connection.
pub type RedisConnection<'a> = PooledConnection<'a, RedisConnectionManager>;

/// Errors raised while building or using the Redis pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedisPoolError {
    /// Failed to build the pool (bad URL or unreachable server).
    #[error("failed to build redis pool: {message}")]
    Build { message: String },
    /// Failed to check out a connection.
    #[error("failed to get redis connection: {message}")]
    Checkout { message: String },
    /// A command failed.
    #[error("redis command failed: {message}")]
    Command { message: String },
    /// The round trip exceeded its deadline.
    #[error("redis {operation} timed out")]
    Timeout { operation: &'static str },
}

impl From<redis::RedisError> for RedisPoolError {
    fn from(value: redis::RedisError) -> Self {
        Self::Command {
            message: value.to_string(),
        }
    }
}

/// Redis pool settings.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    url: String,
    max_size: u32,
    min_idle: Option<u32>,
    connection_timeout: Duration,
    round_trip_timeout: Duration,
}

impl RedisConfig {
    /// Defaults: 10 connections, 5 idle, 5 second checkout and round trip.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_size: 10,
            min_idle: Some(5),
            connection_timeout: Duration::from_secs(5),
            round_trip_timeout: DEFAULT_ROUND_TRIP_TIMEOUT,
        }
    }

    /// Set the maximum number of pooled connections.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the minimum number of idle connections.
    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle;
        self
    }

    /// Set the checkout timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the deadline for each command round trip.
    pub fn with_round_trip_timeout(mut self, timeout: Duration) -> Self {
        self.round_trip_timeout = timeout;
        self
    }

    /// Redis URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Cloneable handle to the shared Redis pool.
#[derive(Clone)]
pub struct RedisPool {
    inner: Pool<RedisConnectionManager>,
    round_trip_timeout: Duration,
}

impl RedisPool {
    /// Build the pool without connecting; connections open on first use so
    /// an unreachable server degrades the cache instead of aborting startup.
    pub fn new(config: RedisConfig) -> Result<Self, RedisPoolError> {
        let manager = RedisConnectionManager::new(config.url.as_str()).map_err(|err| {
            RedisPoolError::Build {
                message: err.to_string(),
            }
        })?;
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.connection_timeout)
            .build_unchecked(manager);
        Ok(Self {
            inner,
            round_trip_timeout: config.round_trip_timeout,
        })
    }

    /// Check out a pooled connection.
    pub async fn get(&self) -> Result<RedisConnection<'_>, RedisPoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| RedisPoolError::Checkout {
                message: err.to_string(),
            })
    }

    /// Run `round_trip` (checkout included) under the round trip deadline.
    pub async fn within<T, F>(&self, operation: &'static str, round_trip: F) -> Result<T, RedisPoolError>
    where
        F: Future<Output = Result<T, RedisPoolError>>,
    {
        tokio::time::timeout(self.round_trip_timeout, round_trip)
            .await
            .map_err(|_| RedisPoolError::Timeout { operation })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn redis_config_defaults() {
        let config = RedisConfig::new("redis://localhost:6379");
        assert_eq!(config.url(), "redis://localhost:6379");
        assert_eq!(config.max_size, 10);
        assert_eq!(config.min_idle, Some(5));
        assert_eq!(config.round_trip_timeout, DEFAULT_ROUND_TRIP_TIMEOUT);
    }

    #[rstest]
    fn redis_config_builder() {
        let config = RedisConfig::new("redis://cache")
            .with_max_size(4)
            .with_min_idle(None)
            .with_connection_timeout(Duration::from_secs(1))
            .with_round_trip_timeout(Duration::from_millis(250));
        assert_eq!(config.max_size, 4);
        assert_eq!(config.min_idle, None);
        assert_eq!(config.connection_timeout, Duration::from_secs(1));
        assert_eq!(config.round_trip_timeout, Duration::from_millis(250));
    }

    #[rstest]
    fn timeout_names_the_operation() {
        let err = RedisPoolError::Timeout { operation: "GET" };
        assert_eq!(err.to_string(), "redis GET timed out");
    }
}
