//! Port for user accounts and their activation invitations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Invitation, NewUser, TokenDigest, User, UserId};

use super::StoreError;

/// Persistence port for user accounts.
///
/// Users are created inactive together with an invitation and later
/// activated; accounts are never removed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert an inactive user and its invitation in one transaction.
    ///
    /// Duplicate usernames or emails fail with [`StoreError::Conflict`]
    /// naming the violated constraint; nothing is written in that case.
    async fn create_and_invite(
        &self,
        user: &NewUser,
        invitation: &Invitation,
    ) -> Result<User, StoreError>;

    /// Fetch a user, failing with [`StoreError::NotFound`] when absent.
    async fn find_by_id(&self, id: UserId) -> Result<User, StoreError>;

    /// Activate the user holding an invitation with `digest` that has not
    /// expired at `now`, and drop that user's invitations, in one
    /// transaction. Returns the activated user's id.
    async fn activate(&self, digest: &TokenDigest, now: DateTime<Utc>) -> Result<UserId, StoreError>;
}
