//! Feed query parsing and validation.
//!
//! A feed query narrows the caller's feed (their own posts plus posts by
//! users they follow) by tag containment, substring search and a creation
//! time range, then applies ordering and an offset window.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Page, PaginationError, SortOrder};

/// Largest number of distinct tags a feed query may filter on.
pub const MAX_TAGS: usize = 5;
/// Longest accepted search text, in characters.
pub const MAX_SEARCH_CHARS: usize = 100;
/// Format accepted by the `since` and `until` parameters.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Validated feed filter, ordering and window.
///
/// # Examples
/// ```
/// use pagination::{FeedQuery, SortOrder};
///
/// let query = FeedQuery::from_query_str("limit=5&sort=asc&tags=go,%20rust,&search=hello")
///     .expect("valid query");
/// assert_eq!(query.page().limit(), 5);
/// assert_eq!(query.sort(), SortOrder::Asc);
/// assert_eq!(query.tags(), ["go", "rust"]);
/// assert_eq!(query.search(), Some("hello"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedQuery {
    page: Page,
    sort: SortOrder,
    tags: Vec<String>,
    search: Option<String>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct RawFeedQuery {
    limit: Option<String>,
    offset: Option<String>,
    sort: Option<String>,
    tags: Option<String>,
    search: Option<String>,
    since: Option<String>,
    until: Option<String>,
}

impl FeedQuery {
    /// Parse a URL query string such as `limit=10&tags=go,rust&sort=asc`.
    ///
    /// Unknown parameters are ignored. When a parameter repeats, the last
    /// occurrence wins.
    ///
    /// # Errors
    /// Returns a [`PaginationError`] describing the first invalid parameter.
    pub fn from_query_str(query: &str) -> Result<Self, PaginationError> {
        let mut raw = RawFeedQuery::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "limit" => &mut raw.limit,
                "offset" => &mut raw.offset,
                "sort" => &mut raw.sort,
                "tags" => &mut raw.tags,
                "search" => &mut raw.search,
                "since" => &mut raw.since,
                "until" => &mut raw.until,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }

        let page = Page::parse(raw.limit.as_deref(), raw.offset.as_deref())?;
        let sort = match raw.sort.as_deref().map(str::trim) {
            None | Some("") => SortOrder::default(),
            Some(value) => value.parse()?,
        };
        let tags = raw.tags.as_deref().map(split_tags).unwrap_or_default();
        let since = parse_bound("since", raw.since.as_deref())?;
        let until = parse_bound("until", raw.until.as_deref())?;

        Self {
            page,
            sort,
            ..Self::default()
        }
        .with_tags(tags)?
        .with_search(raw.search.as_deref().unwrap_or_default())?
        .with_range(since, until)
    }

    /// Replace the offset window.
    #[must_use]
    pub const fn with_page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    /// Replace the ordering.
    #[must_use]
    pub const fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Replace the tag filter, trimming entries and dropping blanks and duplicates.
    ///
    /// # Errors
    /// Returns [`PaginationError::TooManyTags`] when more than [`MAX_TAGS`]
    /// distinct tags remain.
    pub fn with_tags<I, S>(mut self, tags: I) -> Result<Self, PaginationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalised: Vec<String> = Vec::new();
        for tag in tags {
            let trimmed = tag.as_ref().trim();
            if trimmed.is_empty() || normalised.iter().any(|existing| existing == trimmed) {
                continue;
            }
            normalised.push(trimmed.to_owned());
        }
        if normalised.len() > MAX_TAGS {
            return Err(PaginationError::TooManyTags {
                count: normalised.len(),
                max: MAX_TAGS,
            });
        }
        self.tags = normalised;
        Ok(self)
    }

    /// Replace the search text; blank text clears the filter.
    ///
    /// # Errors
    /// Returns [`PaginationError::SearchTooLong`] when the trimmed text
    /// exceeds [`MAX_SEARCH_CHARS`].
    pub fn with_search(mut self, search: &str) -> Result<Self, PaginationError> {
        let trimmed = search.trim();
        let length = trimmed.chars().count();
        if length > MAX_SEARCH_CHARS {
            return Err(PaginationError::SearchTooLong {
                length,
                max: MAX_SEARCH_CHARS,
            });
        }
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        Ok(self)
    }

    /// Replace the creation time bounds. Both bounds are inclusive.
    ///
    /// # Errors
    /// Returns [`PaginationError::InvertedRange`] when `since` is after `until`.
    pub fn with_range(
        mut self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Self, PaginationError> {
        if matches!((since, until), (Some(lower), Some(upper)) if lower > upper) {
            return Err(PaginationError::InvertedRange);
        }
        self.since = since;
        self.until = until;
        Ok(self)
    }

    /// Offset window.
    #[must_use]
    pub const fn page(&self) -> Page {
        self.page
    }

    /// Ordering direction.
    #[must_use]
    pub const fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Tags every returned post must carry.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Case-insensitive substring matched against title or content.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Earliest accepted creation time.
    #[must_use]
    pub const fn since(&self) -> Option<DateTime<Utc>> {
        self.since
    }

    /// Latest accepted creation time.
    #[must_use]
    pub const fn until(&self) -> Option<DateTime<Utc>> {
        self.until
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_owned).collect()
}

fn parse_bound(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, PaginationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .map(|naive| Some(naive.and_utc()))
            .map_err(|_| PaginationError::InvalidTimestamp {
                field,
                value: value.to_owned(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    fn empty_query_uses_defaults() {
        let query = FeedQuery::from_query_str("").expect("empty query is valid");
        assert_eq!(query, FeedQuery::default());
        assert_eq!(query.sort(), SortOrder::Desc);
        assert!(query.tags().is_empty());
        assert_eq!(query.search(), None);
    }

    #[rstest]
    fn tags_are_trimmed_and_deduplicated() {
        let query = FeedQuery::from_query_str("tags=%20go,,rust,go,%20").expect("valid tags");
        assert_eq!(query.tags(), ["go", "rust"]);
    }

    #[rstest]
    fn rejects_more_than_five_tags() {
        let err = FeedQuery::from_query_str("tags=a,b,c,d,e,f").expect_err("too many tags");
        assert_eq!(err, PaginationError::TooManyTags { count: 6, max: 5 });
    }

    #[rstest]
    fn rejects_long_search() {
        let search = "x".repeat(MAX_SEARCH_CHARS + 1);
        let err = FeedQuery::from_query_str(&format!("search={search}")).expect_err("too long");
        assert!(matches!(err, PaginationError::SearchTooLong { length: 101, .. }));
    }

    #[rstest]
    fn blank_search_clears_filter() {
        let query = FeedQuery::from_query_str("search=%20%20").expect("blank search");
        assert_eq!(query.search(), None);
    }

    #[rstest]
    fn parses_time_bounds() {
        let query = FeedQuery::from_query_str(
            "since=2024-01-01%2000:00:00&until=2024-02-01+12:30:00",
        )
        .expect("valid bounds");
        assert_eq!(
            query.since(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("date"))
        );
        assert_eq!(
            query.until(),
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 12, 30, 0).single().expect("date"))
        );
    }

    #[rstest]
    #[case("since=yesterday", "since")]
    #[case("until=2024-13-01%2000:00:00", "until")]
    fn rejects_malformed_bounds(#[case] raw: &str, #[case] field: &str) {
        let err = FeedQuery::from_query_str(raw).expect_err("malformed bound");
        assert!(matches!(
            err,
            PaginationError::InvalidTimestamp { field: got, .. } if got == field
        ));
    }

    #[rstest]
    fn rejects_inverted_range() {
        let err = FeedQuery::from_query_str(
            "since=2024-02-01%2000:00:00&until=2024-01-01%2000:00:00",
        )
        .expect_err("inverted");
        assert_eq!(err, PaginationError::InvertedRange);
    }

    #[rstest]
    fn ignores_unknown_parameters() {
        let query = FeedQuery::from_query_str("page=3&limit=2").expect("valid query");
        assert_eq!(query.page().limit(), 2);
    }

    #[rstest]
    fn serialises_round_trip_through_json() {
        let query = FeedQuery::from_query_str("limit=3&sort=asc&tags=go").expect("valid");
        let json = serde_json::to_string(&query).expect("serialise");
        let decoded: FeedQuery = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(decoded, query);
    }
}
