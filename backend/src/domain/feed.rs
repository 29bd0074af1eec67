//! Feed entries returned by the feed query engine.

use serde::{Deserialize, Serialize};

use super::Post;

/// A post in a user's feed, annotated with its author and comment count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub post: Post,
    pub username: String,
    pub comments_count: u64,
}
