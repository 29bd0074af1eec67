//! Validation failures raised while building pagination values.

use thiserror::Error;

/// Errors produced when a pagination or feed query parameter is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// `limit` was not an integer within the accepted range.
    #[error("limit must be an integer between 1 and {max}, got `{value}`")]
    InvalidLimit {
        /// Raw value supplied by the caller.
        value: String,
        /// Largest accepted limit.
        max: u32,
    },
    /// `offset` was not a non-negative integer.
    #[error("offset must be a non-negative integer, got `{value}`")]
    InvalidOffset {
        /// Raw value supplied by the caller.
        value: String,
    },
    /// `sort` was neither `asc` nor `desc`.
    #[error("sort must be `asc` or `desc`, got `{value}`")]
    InvalidSort {
        /// Raw value supplied by the caller.
        value: String,
    },
    /// More tags were supplied than a feed query accepts.
    #[error("at most {max} tags are allowed, got {count}")]
    TooManyTags {
        /// Number of distinct tags supplied.
        count: usize,
        /// Largest accepted tag count.
        max: usize,
    },
    /// The search text exceeded the accepted length.
    #[error("search must be at most {max} characters, got {length}")]
    SearchTooLong {
        /// Character count of the trimmed search text.
        length: usize,
        /// Largest accepted character count.
        max: usize,
    },
    /// A `since`/`until` bound could not be parsed.
    #[error("{field} must use the `YYYY-MM-DD HH:MM:SS` format, got `{value}`")]
    InvalidTimestamp {
        /// Query parameter name.
        field: &'static str,
        /// Raw value supplied by the caller.
        value: String,
    },
    /// `since` falls after `until`.
    #[error("since must not be later than until")]
    InvertedRange,
}
