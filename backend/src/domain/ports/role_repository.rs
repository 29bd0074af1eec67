//! Port for role lookups.

use async_trait::async_trait;

use crate::domain::{Role, RoleId};

use super::StoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Fetch a role by its unique name.
    async fn find_by_name(&self, name: &str) -> Result<Role, StoreError>;

    /// Fetch a role by id.
    async fn find_by_id(&self, id: RoleId) -> Result<Role, StoreError>;
}
