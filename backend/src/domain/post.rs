//! Post aggregate and its validation rules.
//!
//! Posts are the only mutable entity guarded by optimistic concurrency. The
//! store assigns `version = 1` on insert and increments it by exactly one on
//! every accepted update; an update is accepted only when the caller's
//! expected version matches the stored one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Error, PostId, UserId};

/// Longest accepted title, in characters.
pub const MAX_TITLE_CHARS: usize = 100;
/// Longest accepted body, in characters.
pub const MAX_CONTENT_CHARS: usize = 1000;
/// Largest number of distinct tags on a post.
pub const MAX_POST_TAGS: usize = 5;

/// Validation failures for post fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostValidationError {
    /// Title is blank.
    #[error("title must not be empty")]
    EmptyTitle,
    /// Title is too long.
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    /// Content is blank.
    #[error("content must not be empty")]
    EmptyContent,
    /// Content is too long.
    #[error("content must be at most {max} characters")]
    ContentTooLong { max: usize },
    /// Too many distinct tags.
    #[error("a post may carry at most {max} tags")]
    TooManyTags { max: usize },
}

impl From<PostValidationError> for Error {
    fn from(value: PostValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}

/// Stored post, including its current optimistic-lock version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
}

/// Validated fields for a post that has not been stored yet.
///
/// # Examples
/// ```
/// use social_backend::domain::{NewPost, UserId};
///
/// let author = UserId::new(1).expect("valid id");
/// let post = NewPost::new(author, "Hello", "First post", ["go", " go ", ""])
///     .expect("valid post");
/// assert_eq!(post.tags(), ["go"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    user_id: UserId,
    title: String,
    content: String,
    tags: Vec<String>,
}

impl NewPost {
    /// Validate a draft post.
    pub fn new<I, S>(
        user_id: UserId,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: I,
    ) -> Result<Self, PostValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (title, content, tags) = validate_fields(title.into(), content.into(), tags)?;
        Ok(Self {
            user_id,
            title,
            content,
            tags,
        })
    }

    /// Owning user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Body.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Distinct tags in first-seen order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Partial change requested by a caller. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Validated conditional write: the merged post fields plus the version the
/// caller read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostUpdate {
    id: PostId,
    title: String,
    content: String,
    tags: Vec<String>,
    expected_version: u32,
}

impl PostUpdate {
    /// Merge `patch` over `current` and validate the result.
    pub fn merge(
        current: &Post,
        patch: PostPatch,
        expected_version: u32,
    ) -> Result<Self, PostValidationError> {
        let PostPatch {
            title,
            content,
            tags,
        } = patch;
        let (title, content, tags) = validate_fields(
            title.unwrap_or_else(|| current.title.clone()),
            content.unwrap_or_else(|| current.content.clone()),
            tags.unwrap_or_else(|| current.tags.clone()),
        )?;
        Ok(Self {
            id: current.id,
            title,
            content,
            tags,
            expected_version,
        })
    }

    /// Target post.
    pub fn id(&self) -> PostId {
        self.id
    }

    /// New title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// New body.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// New tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Version the caller based the change on.
    pub fn expected_version(&self) -> u32 {
        self.expected_version
    }
}

fn validate_fields<I, S>(
    title: String,
    content: String,
    tags: I,
) -> Result<(String, String, Vec<String>), PostValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let title = title.trim().to_owned();
    if title.is_empty() {
        return Err(PostValidationError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(PostValidationError::TitleTooLong {
            max: MAX_TITLE_CHARS,
        });
    }
    if content.trim().is_empty() {
        return Err(PostValidationError::EmptyContent);
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(PostValidationError::ContentTooLong {
            max: MAX_CONTENT_CHARS,
        });
    }
    let tags = normalise_tags(tags);
    if tags.len() > MAX_POST_TAGS {
        return Err(PostValidationError::TooManyTags { max: MAX_POST_TAGS });
    }
    Ok((title, content, tags))
}

/// Trim tags and drop blanks and duplicates, keeping first-seen order.
pub fn normalise_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let trimmed = tag.as_ref().trim();
        if !trimmed.is_empty() && !out.iter().any(|seen| seen == trimmed) {
            out.push(trimmed.to_owned());
        }
    }
    out
}
