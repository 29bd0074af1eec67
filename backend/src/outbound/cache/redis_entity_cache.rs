//! Redis implementation of the `EntityCache` port.
//!
//! Entries are plain `SET key payload EX ttl`; the last write wins. An
//! optional jitter spreads expiry of entries written together.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis::{self, AsyncCommands};
use rand::Rng;
use tracing::debug;

use crate::domain::ports::{CacheError, CacheKey, EntityCache};

use super::redis_pool::{RedisPool, RedisPoolError};

/// Entity cache backed by the shared Redis pool.
#[derive(Clone)]
pub struct RedisEntityCache {
    pool: RedisPool,
    ttl_jitter: Duration,
}

impl RedisEntityCache {
    /// Wrap the pool with no TTL jitter.
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            ttl_jitter: Duration::ZERO,
        }
    }

    /// Add up to `jitter` to every TTL.
    #[must_use]
    pub fn with_ttl_jitter(mut self, jitter: Duration) -> Self {
        self.ttl_jitter = jitter;
        self
    }

    fn expiry_seconds(&self, ttl: Duration) -> u64 {
        let jitter = self.ttl_jitter.as_secs();
        let extra = if jitter == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter)
        };
        ttl.as_secs().max(1).saturating_add(extra)
    }
}

fn map_pool_error(error: RedisPoolError) -> CacheError {
    match error {
        RedisPoolError::Timeout { operation } => CacheError::timeout(operation),
        other => CacheError::backend(other.to_string()),
    }
}

#[async_trait]
impl EntityCache for RedisEntityCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        self.pool
            .within("GET", async {
                let mut conn = self.pool.get().await?;
                let payload: Option<String> = conn.get(key.as_str()).await?;
                debug!(key = %key, hit = payload.is_some(), "cache read");
                Ok(payload)
            })
            .await
            .map_err(map_pool_error)
    }

    async fn set(&self, key: &CacheKey, payload: String, ttl: Duration) -> Result<(), CacheError> {
        let seconds = self.expiry_seconds(ttl);
        self.pool
            .within("SET", async {
                let mut conn = self.pool.get().await?;
                let () = conn.set_ex(key.as_str(), payload, seconds).await?;
                Ok(())
            })
            .await
            .map_err(map_pool_error)
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.pool
            .within("DEL", async {
                let mut conn = self.pool.get().await?;
                let _: u64 = conn.del(key.as_str()).await?;
                Ok(())
            })
            .await
            .map_err(map_pool_error)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.pool
            .within("PING", async {
                let mut conn = self.pool.get().await?;
                let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
                Ok(())
            })
            .await
            .map_err(map_pool_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_timeouts_become_cache_timeouts() {
        let mapped = map_pool_error(RedisPoolError::Timeout { operation: "GET" });
        assert_eq!(mapped, CacheError::timeout("GET"));
    }

    #[rstest]
    fn other_pool_errors_are_backend_failures() {
        let mapped = map_pool_error(RedisPoolError::Checkout {
            message: "refused".to_owned(),
        });
        assert!(matches!(mapped, CacheError::Backend { .. }));
    }
}
