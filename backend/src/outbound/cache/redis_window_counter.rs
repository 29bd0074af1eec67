//! Redis implementation of the `WindowCounter` port.
//!
//! `INCR` is atomic on the server, so concurrent callers never lose counts;
//! the limiter sets the window expiry only when `INCR` returns 1.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;

use crate::domain::ports::{CounterError, WindowCounter};

use super::redis_pool::{RedisPool, RedisPoolError};

/// Window counter backed by the shared Redis pool.
#[derive(Clone)]
pub struct RedisWindowCounter {
    pool: RedisPool,
}

impl RedisWindowCounter {
    /// Wrap the pool.
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: RedisPoolError) -> CounterError {
    CounterError::backend(error.to_string())
}

/// Interpret a `TTL` reply: `-2` missing key, `-1` no expiry.
fn ttl_from_reply(reply: i64) -> Option<Duration> {
    u64::try_from(reply).ok().map(Duration::from_secs)
}

fn whole_seconds(window: Duration) -> i64 {
    i64::try_from(window.as_secs().max(1)).unwrap_or(i64::MAX)
}

#[async_trait]
impl WindowCounter for RedisWindowCounter {
    async fn current(&self, key: &str) -> Result<Option<u64>, CounterError> {
        self.pool
            .within("GET", async {
                let mut conn = self.pool.get().await?;
                let count: Option<u64> = conn.get(key).await?;
                Ok(count)
            })
            .await
            .map_err(map_pool_error)
    }

    async fn increment(&self, key: &str) -> Result<u64, CounterError> {
        self.pool
            .within("INCR", async {
                let mut conn = self.pool.get().await?;
                let count: u64 = conn.incr(key, 1_u64).await?;
                Ok(count)
            })
            .await
            .map_err(map_pool_error)
    }

    async fn expire(&self, key: &str, window: Duration) -> Result<(), CounterError> {
        let seconds = whole_seconds(window);
        self.pool
            .within("EXPIRE", async {
                let mut conn = self.pool.get().await?;
                let _: bool = conn.expire(key, seconds).await?;
                Ok(())
            })
            .await
            .map_err(map_pool_error)
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, CounterError> {
        self.pool
            .within("TTL", async {
                let mut conn = self.pool.get().await?;
                let reply: i64 = conn.ttl(key).await?;
                Ok(ttl_from_reply(reply))
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
    #[case(-2, None)]
    #[case(-1, None)]
    #[case(0, Some(Duration::ZERO))]
    #[case(42, Some(Duration::from_secs(42)))]
    fn interprets_ttl_replies(#[case] reply: i64, #[case] expected: Option<Duration>) {
        assert_eq!(ttl_from_reply(reply), expected);
    }

    #[rstest]
    #[case(Duration::from_millis(200), 1)]
    #[case(Duration::from_secs(60), 60)]
    fn windows_round_to_whole_seconds(#[case] window: Duration, #[case] expected: i64) {
        assert_eq!(whole_seconds(window), expected);
    }
}
