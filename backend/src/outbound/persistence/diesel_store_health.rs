//! Store reachability probe backing the readiness endpoint.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StoreError, StoreHealth};

use super::diesel_helpers::{map_diesel_error, map_pool_error, with_deadline};
use super::pool::DbPool;

/// Runs `SELECT 1` through the shared pool.
#[derive(Clone)]
pub struct DieselStoreHealth {
    pool: DbPool,
}

impl DieselStoreHealth {
    /// Create a probe over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreHealth for DieselStoreHealth {
    async fn check(&self) -> Result<(), StoreError> {
        with_deadline(&self.pool, "health check", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::sql_query("SELECT 1")
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(())
        })
        .await
    }
}
