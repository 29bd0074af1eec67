//! Port for the side cache consulted before the entity store.
//!
//! Payloads are opaque serialised strings; typed encoding lives in the
//! domain's cache-aside reader so adapters stay format agnostic.

use std::time::Duration;

use async_trait::async_trait;

use super::{CacheKey, define_port_error};

define_port_error! {
    /// Errors surfaced by cache adapters. A missing key is not an error.
    pub enum CacheError {
        /// Cache backend is unreachable or rejected the command.
        Backend { message: String } => "cache backend failure: {message}",
        /// The round trip exceeded its deadline.
        Timeout { operation: String } => "cache {operation} timed out",
        /// A payload could not be encoded or decoded.
        Serialization { message: String } => "cache serialisation failed: {message}",
    }
}

/// Key-value side cache for serialised entities.
///
/// Entries expire after their TTL; writes are last-write-wins with no
/// version check against the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityCache: Send + Sync {
    /// Read the payload stored under `key`; `Ok(None)` on a miss.
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    /// Store `payload` under `key`, replacing any existing entry.
    async fn set(&self, key: &CacheKey, payload: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove the entry under `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError>;

    /// Round trip to the backend without touching any key.
    async fn ping(&self) -> Result<(), CacheError>;
}
