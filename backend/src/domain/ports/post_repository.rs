//! Port for post persistence with optimistic concurrency.
//!
//! # Version semantics
//!
//! - Inserted posts start at version 1.
//! - [`PostRepository::update`] is a conditional write: it succeeds only
//!   when the stored version equals the update's expected version, and then
//!   increments the version by exactly one.
//! - A rejected update is reported as [`StoreError::NotFound`] when the row
//!   is missing and as [`StoreError::VersionMismatch`] when it exists with a
//!   different version.

use async_trait::async_trait;

use crate::domain::{NewPost, Post, PostId, PostUpdate};

use super::StoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post, returning it with its store-assigned id and timestamps.
    async fn create(&self, post: &NewPost) -> Result<Post, StoreError>;

    /// Fetch a post, failing with [`StoreError::NotFound`] when absent.
    async fn find_by_id(&self, id: PostId) -> Result<Post, StoreError>;

    /// Apply a conditional update and return the post at its new version.
    async fn update(&self, update: &PostUpdate) -> Result<Post, StoreError>;

    /// Hard-delete a post; deleting a missing post is [`StoreError::NotFound`].
    async fn delete(&self, id: PostId) -> Result<(), StoreError>;
}
