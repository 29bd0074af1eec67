//! Redis adapters for the entity cache and the rate limiter counter.
//!
//! Both adapters share one `bb8-redis` pool. Every round trip runs under the
//! pool's deadline; adapters report failures as port errors and leave the
//! fail-open or fail-closed decision to the domain.

mod redis_entity_cache;
mod redis_pool;
mod redis_window_counter;

pub use redis_entity_cache::RedisEntityCache;
pub use redis_pool::{
    DEFAULT_ROUND_TRIP_TIMEOUT, RedisConfig, RedisConnection, RedisPool, RedisPoolError,
};
pub use redis_window_counter::RedisWindowCounter;
