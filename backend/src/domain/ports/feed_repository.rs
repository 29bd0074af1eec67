//! Port for the feed query engine.

use async_trait::async_trait;
use pagination::FeedQuery;

use crate::domain::{FeedItem, UserId};

use super::StoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedRepository: Send + Sync {
    /// Posts authored by `user_id` or by anyone `user_id` follows, filtered
    /// and ordered by `(created_at, id)` as `query` describes.
    ///
    /// - `search` matches title or content, case-insensitively.
    /// - `tags` requires every listed tag to be present on the post.
    /// - `since`/`until` bound `created_at` inclusively.
    async fn feed(&self, user_id: UserId, query: &FeedQuery) -> Result<Vec<FeedItem>, StoreError>;
}
