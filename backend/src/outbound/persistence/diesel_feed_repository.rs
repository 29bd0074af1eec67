//! PostgreSQL-backed feed query engine.
//!
//! One raw statement covers every filter; absent filters are bound as NULL
//! (or an empty array) and short-circuit in SQL, so the bind list is fixed.
//! Only the sort direction is spliced into the text, from
//! [`SortOrder::as_sql`](pagination::SortOrder::as_sql).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::sql_query;
use diesel::sql_types::{Array, BigInt, Nullable, Text, Timestamptz};
use diesel_async::RunQueryDsl;
use pagination::FeedQuery;

use crate::domain::ports::{FeedRepository, StoreError};
use crate::domain::{FeedItem, UserId};

use super::diesel_helpers::{map_diesel_error, map_pool_error, with_deadline};
use super::models::FeedRow;
use super::pool::DbPool;

/// Diesel-backed implementation of the `FeedRepository` port.
#[derive(Clone)]
pub struct DieselFeedRepository {
    pool: DbPool,
}

impl DieselFeedRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn feed_sql(direction: &str) -> String {
    format!(
        "SELECT p.id, p.user_id, p.title, p.content, p.tags, p.created_at, p.updated_at, \
                p.version, u.username, COUNT(c.id) AS comments_count \
         FROM posts p \
         JOIN users u ON u.id = p.user_id \
         LEFT JOIN comments c ON c.post_id = p.id \
         WHERE (p.user_id = $1 \
                OR p.user_id IN (SELECT f.followed_id FROM followers f WHERE f.follower_id = $1)) \
           AND ($2::text IS NULL OR p.title ILIKE $2 OR p.content ILIKE $2) \
           AND (cardinality($3::text[]) = 0 OR p.tags @> $3::text[]) \
           AND ($4::timestamptz IS NULL OR p.created_at >= $4) \
           AND ($5::timestamptz IS NULL OR p.created_at <= $5) \
         GROUP BY p.id, u.username \
         ORDER BY p.created_at {direction}, p.id {direction} \
         LIMIT $6 OFFSET $7"
    )
}

/// Wrap `search` for a substring `ILIKE`, escaping pattern metacharacters.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn to_i64<T>(value: T, what: &str) -> Result<i64, StoreError>
where
    T: TryInto<i64> + Copy + std::fmt::Display,
{
    value
        .try_into()
        .map_err(|_| StoreError::invalid_data(format!("{what} {value} out of range")))
}

#[async_trait]
impl FeedRepository for DieselFeedRepository {
    async fn feed(&self, user_id: UserId, query: &FeedQuery) -> Result<Vec<FeedItem>, StoreError> {
        let limit = to_i64(query.page().limit(), "limit")?;
        let offset = to_i64(query.page().offset(), "offset")?;
        let search = query.search().map(like_pattern);
        let tags = query.tags().to_vec();
        let since: Option<DateTime<Utc>> = query.since();
        let until: Option<DateTime<Utc>> = query.until();
        let sql = feed_sql(query.sort().as_sql());

        with_deadline(&self.pool, "load feed", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<FeedRow> = sql_query(sql)
                .bind::<BigInt, _>(user_id.get())
                .bind::<Nullable<Text>, _>(search)
                .bind::<Array<Text>, _>(tags)
                .bind::<Nullable<Timestamptz>, _>(since)
                .bind::<Nullable<Timestamptz>, _>(until)
                .bind::<BigInt, _>(limit)
                .bind::<BigInt, _>(offset)
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            rows.into_iter().map(FeedItem::try_from).collect()
        })
        .await
    }
}
