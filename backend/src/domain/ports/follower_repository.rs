//! Port for the follower graph.

use async_trait::async_trait;

use crate::domain::FollowEdge;

use super::StoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FollowerRepository: Send + Sync {
    /// Record the edge. An existing edge is [`StoreError::Conflict`]; an
    /// unknown user is [`StoreError::InvalidReference`].
    async fn follow(&self, edge: &FollowEdge) -> Result<(), StoreError>;

    /// Remove the edge, failing with [`StoreError::NotFound`] when absent.
    async fn unfollow(&self, edge: &FollowEdge) -> Result<(), StoreError>;
}
