//! PostgreSQL-backed `FollowerRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::FollowEdge;
use crate::domain::ports::{FollowerRepository, StoreError};

use super::diesel_helpers::{map_diesel_error, map_pool_error, with_deadline};
use super::pool::DbPool;
use super::schema::followers;

/// Diesel-backed implementation of the `FollowerRepository` port.
#[derive(Clone)]
pub struct DieselFollowerRepository {
    pool: DbPool,
}

impl DieselFollowerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowerRepository for DieselFollowerRepository {
    async fn follow(&self, edge: &FollowEdge) -> Result<(), StoreError> {
        with_deadline(&self.pool, "follow user", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::insert_into(followers::table)
                .values((
                    followers::follower_id.eq(edge.follower().get()),
                    followers::followed_id.eq(edge.followed().get()),
                ))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(())
        })
        .await
    }

    async fn unfollow(&self, edge: &FollowEdge) -> Result<(), StoreError> {
        with_deadline(&self.pool, "unfollow user", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let deleted = diesel::delete(
                followers::table.filter(
                    followers::follower_id
                        .eq(edge.follower().get())
                        .and(followers::followed_id.eq(edge.followed().get())),
                ),
            )
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(StoreError::not_found("follow edge"));
            }
            Ok(())
        })
        .await
    }
}
