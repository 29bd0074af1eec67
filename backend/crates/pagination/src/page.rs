//! Bounded limit/offset window.

use serde::{Deserialize, Serialize};

use crate::PaginationError;

/// Largest page a caller may request.
pub const MAX_LIMIT: u32 = 20;
/// Page size used when the caller omits `limit`.
pub const DEFAULT_LIMIT: u32 = 20;

/// Validated limit/offset pair.
///
/// ## Invariants
/// - `1 <= limit <= MAX_LIMIT`
///
/// # Examples
/// ```
/// use pagination::Page;
///
/// let page = Page::new(10, 30).expect("valid page");
/// assert_eq!(page.limit(), 10);
/// assert_eq!(page.offset(), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    limit: u32,
    offset: u64,
}

impl Page {
    /// Build a page, rejecting limits outside `1..=MAX_LIMIT`.
    ///
    /// # Errors
    /// Returns [`PaginationError::InvalidLimit`] when `limit` is out of range.
    pub fn new(limit: u32, offset: u64) -> Result<Self, PaginationError> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PaginationError::InvalidLimit {
                value: limit.to_string(),
                max: MAX_LIMIT,
            });
        }
        Ok(Self { limit, offset })
    }

    /// Parse raw `limit`/`offset` query values, applying defaults when absent.
    ///
    /// # Errors
    /// Returns [`PaginationError::InvalidLimit`] or
    /// [`PaginationError::InvalidOffset`] for malformed values.
    pub fn parse(limit: Option<&str>, offset: Option<&str>) -> Result<Self, PaginationError> {
        let parsed_limit = match limit.map(str::trim) {
            None | Some("") => DEFAULT_LIMIT,
            Some(raw) => raw.parse::<u32>().map_err(|_| PaginationError::InvalidLimit {
                value: raw.to_owned(),
                max: MAX_LIMIT,
            })?,
        };
        let parsed_offset = match offset.map(str::trim) {
            None | Some("") => 0,
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| PaginationError::InvalidOffset {
                    value: raw.to_owned(),
                })?,
        };
        Self::new(parsed_limit, parsed_offset)
    }

    /// Maximum number of items to return.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}
