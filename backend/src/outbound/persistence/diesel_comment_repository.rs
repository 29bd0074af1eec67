//! PostgreSQL-backed `CommentRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CommentRepository, StoreError};
use crate::domain::{Comment, NewComment, PostId};

use super::diesel_helpers::{map_diesel_error, map_pool_error, with_deadline};
use super::models::{CommentRow, NewCommentRow};
use super::pool::DbPool;
use super::schema::{comments, users};

/// Diesel-backed implementation of the `CommentRepository` port.
#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for DieselCommentRepository {
    async fn create(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        with_deadline(&self.pool, "create comment", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: CommentRow = diesel::insert_into(comments::table)
                .values(NewCommentRow {
                    post_id: comment.post_id.get(),
                    user_id: comment.user_id.get(),
                    content: comment.content(),
                })
                .returning(CommentRow::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            let username: String = users::table
                .find(row.user_id)
                .select(users::username)
                .first(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            row.into_comment(username)
        })
        .await
    }

    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, StoreError> {
        with_deadline(&self.pool, "list comments", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<(CommentRow, String)> = comments::table
                .inner_join(users::table)
                .filter(comments::post_id.eq(post_id.get()))
                .order_by((comments::created_at.desc(), comments::id.desc()))
                .select((CommentRow::as_select(), users::username))
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            rows.into_iter()
                .map(|(row, username)| row.into_comment(username))
                .collect()
        })
        .await
    }
}
