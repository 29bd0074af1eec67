//! Port for comment persistence.

use async_trait::async_trait;

use crate::domain::{Comment, NewComment, PostId};

use super::StoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment. Unknown posts or authors fail with
    /// [`StoreError::InvalidReference`].
    async fn create(&self, comment: &NewComment) -> Result<Comment, StoreError>;

    /// Comments on `post_id`, newest first.
    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, StoreError>;
}
