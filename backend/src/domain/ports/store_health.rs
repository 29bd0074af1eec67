//! Port for probing entity store reachability.

use async_trait::async_trait;

use super::StoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Round trip a trivial query through the store's connection pool.
    async fn check(&self) -> Result<(), StoreError>;
}

/// Health probe that always reports a reachable store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureStoreHealth;

#[async_trait]
impl StoreHealth for FixtureStoreHealth {
    async fn check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
