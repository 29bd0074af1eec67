//! Comments attached to posts. Comments are created and listed, never edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CommentId, Error, PostId, UserId};

/// Longest accepted comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 500;

/// Validation failures for comment content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommentValidationError {
    #[error("comment must not be empty")]
    Empty,
    #[error("comment must be at most {max} characters")]
    TooLong { max: usize },
}

impl From<CommentValidationError> for Error {
    fn from(value: CommentValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}

/// Stored comment with its author's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Validated comment awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub user_id: UserId,
    content: String,
}

impl NewComment {
    /// Validate comment content.
    pub fn new(
        post_id: PostId,
        user_id: UserId,
        content: impl Into<String>,
    ) -> Result<Self, CommentValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(CommentValidationError::Empty);
        }
        if content.chars().count() > MAX_COMMENT_CHARS {
            return Err(CommentValidationError::TooLong {
                max: MAX_COMMENT_CHARS,
            });
        }
        Ok(Self {
            post_id,
            user_id,
            content,
        })
    }

    /// Comment body.
    pub fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ids() -> (PostId, UserId) {
        (
            PostId::new(1).expect("post id"),
            UserId::new(2).expect("user id"),
        )
    }

    #[rstest]
    #[case("", CommentValidationError::Empty)]
    #[case("  \n", CommentValidationError::Empty)]
    fn rejects_blank_comments(#[case] content: &str, #[case] expected: CommentValidationError) {
        let (post, user) = ids();
        assert_eq!(NewComment::new(post, user, content), Err(expected));
    }

    #[rstest]
    fn enforces_length_limit() {
        let (post, user) = ids();
        assert!(NewComment::new(post, user, "x".repeat(MAX_COMMENT_CHARS)).is_ok());
        assert_eq!(
            NewComment::new(post, user, "x".repeat(MAX_COMMENT_CHARS + 1)),
            Err(CommentValidationError::TooLong { max: 500 })
        );
    }
}
