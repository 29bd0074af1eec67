//! PostgreSQL-backed `PostRepository` with version-checked updates.
//!
//! Updates are a single conditional `UPDATE ... WHERE id = $1 AND version = $2`
//! that bumps `version` in the same statement. When no row matches, a
//! follow-up read tells a missing post apart from a lost race.

use async_trait::async_trait;
use diesel::OptionalExtension;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{PostRepository, StoreError};
use crate::domain::{NewPost, Post, PostId, PostUpdate};

use super::diesel_helpers::{
    cast_version, cast_version_for_db, map_diesel_error, map_pool_error, with_deadline,
};
use super::models::{NewPostRow, PostRow};
use super::pool::DbPool;
use super::schema::posts;

const ENTITY: &str = "post";

/// Diesel-backed implementation of the `PostRepository` port.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_post_error(error: diesel::result::Error) -> StoreError {
    match error {
        diesel::result::Error::NotFound => StoreError::not_found(ENTITY),
        other => map_diesel_error(other),
    }
}

/// Classify a zero-row conditional update.
async fn disambiguate_update_failure(
    conn: &mut AsyncPgConnection,
    id: PostId,
    expected: u32,
) -> StoreError {
    let current: Result<Option<i32>, _> = posts::table
        .find(id.get())
        .select(posts::version)
        .first(conn)
        .await
        .optional();

    match current {
        Ok(Some(version)) => match cast_version(version) {
            Ok(actual) => StoreError::version_mismatch(expected, actual),
            Err(err) => err,
        },
        Ok(None) => StoreError::not_found(ENTITY),
        Err(err) => map_diesel_error(err),
    }
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn create(&self, post: &NewPost) -> Result<Post, StoreError> {
        with_deadline(&self.pool, "create post", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: PostRow = diesel::insert_into(posts::table)
                .values(NewPostRow {
                    user_id: post.user_id().get(),
                    title: post.title(),
                    content: post.content(),
                    tags: post.tags(),
                    version: 1,
                })
                .returning(PostRow::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Post::try_from(row)
        })
        .await
    }

    async fn find_by_id(&self, id: PostId) -> Result<Post, StoreError> {
        with_deadline(&self.pool, "find post", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: PostRow = posts::table
                .find(id.get())
                .select(PostRow::as_select())
                .first(&mut conn)
                .await
                .map_err(map_post_error)?;
            Post::try_from(row)
        })
        .await
    }

    async fn update(&self, update: &PostUpdate) -> Result<Post, StoreError> {
        with_deadline(&self.pool, "update post", async {
            let expected = cast_version_for_db(update.expected_version())?;
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;

            let updated: Option<PostRow> = diesel::update(
                posts::table.filter(
                    posts::id
                        .eq(update.id().get())
                        .and(posts::version.eq(expected)),
                ),
            )
            .set((
                posts::title.eq(update.title()),
                posts::content.eq(update.content()),
                posts::tags.eq(update.tags()),
                posts::version.eq(posts::version + 1),
                posts::updated_at.eq(diesel::dsl::now),
            ))
            .returning(PostRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

            match updated {
                Some(row) => Post::try_from(row),
                None => Err(disambiguate_update_failure(
                    &mut conn,
                    update.id(),
                    update.expected_version(),
                )
                .await),
            }
        })
        .await
    }

    async fn delete(&self, id: PostId) -> Result<(), StoreError> {
        with_deadline(&self.pool, "delete post", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let deleted = diesel::delete(posts::table.find(id.get()))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(StoreError::not_found(ENTITY));
            }
            Ok(())
        })
        .await
    }
}
