//! Port for the shared counter backing the fixed-window rate limiter.

use std::time::Duration;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by window counter adapters.
    pub enum CounterError {
        /// Counter backend is unreachable or rejected the command.
        Backend { message: String } => "rate limit counter failure: {message}",
    }
}

/// Atomic per-key counters with expiry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WindowCounter: Send + Sync {
    /// Current count, or `None` when the key does not exist.
    async fn current(&self, key: &str) -> Result<Option<u64>, CounterError>;

    /// Atomically increment and return the new count. Missing keys start at 0.
    async fn increment(&self, key: &str) -> Result<u64, CounterError>;

    /// Expire `key` after `window`.
    async fn expire(&self, key: &str, window: Duration) -> Result<(), CounterError>;

    /// Time left before `key` expires, or `None` when it has no expiry.
    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, CounterError>;
}
