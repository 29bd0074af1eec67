//! Offset pagination and feed query primitives shared by the social backend.
//!
//! The HTTP adapter parses raw query strings into a [`FeedQuery`], and the
//! persistence adapters read the validated limit, offset, ordering and
//! filters back out of it. Validation happens once, here, so every store
//! implementation can trust the values it receives.

mod error;
mod feed_query;
mod page;
mod sort;

pub use error::PaginationError;
pub use feed_query::{FeedQuery, MAX_SEARCH_CHARS, MAX_TAGS, TIMESTAMP_FORMAT};
pub use page::{DEFAULT_LIMIT, MAX_LIMIT, Page};
pub use sort::SortOrder;
