//! PostgreSQL-backed `RoleRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RoleRepository, StoreError};
use crate::domain::{Role, RoleId};

use super::diesel_helpers::{map_diesel_error, map_pool_error, with_deadline};
use super::models::RoleRow;
use super::pool::DbPool;
use super::schema::roles;

/// Diesel-backed implementation of the `RoleRepository` port.
#[derive(Clone)]
pub struct DieselRoleRepository {
    pool: DbPool,
}

impl DieselRoleRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_role_error(error: diesel::result::Error) -> StoreError {
    match error {
        diesel::result::Error::NotFound => StoreError::not_found("role"),
        other => map_diesel_error(other),
    }
}

#[async_trait]
impl RoleRepository for DieselRoleRepository {
    async fn find_by_name(&self, name: &str) -> Result<Role, StoreError> {
        with_deadline(&self.pool, "find role", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: RoleRow = roles::table
                .filter(roles::name.eq(name))
                .select(RoleRow::as_select())
                .first(&mut conn)
                .await
                .map_err(map_role_error)?;
            Role::try_from(row)
        })
        .await
    }

    async fn find_by_id(&self, id: RoleId) -> Result<Role, StoreError> {
        with_deadline(&self.pool, "find role", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: RoleRow = roles::table
                .find(id.get())
                .select(RoleRow::as_select())
                .first(&mut conn)
                .await
                .map_err(map_role_error)?;
            Role::try_from(row)
        })
        .await
    }
}
