//! PostgreSQL-backed `UserRepository`.
//!
//! Registration and activation each run in a single transaction so a user
//! never exists without its invitation and an invitation never outlives an
//! activation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::OptionalExtension;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{StoreError, UserRepository};
use crate::domain::{Invitation, NewUser, TokenDigest, User, UserId};

use super::diesel_helpers::{map_diesel_error, map_pool_error, with_deadline};
use super::models::{NewInvitationRow, NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::{user_invitations, users};

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create_and_invite(
        &self,
        user: &NewUser,
        invitation: &Invitation,
    ) -> Result<User, StoreError> {
        with_deadline(&self.pool, "register user", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let new_row = NewUserRow {
                username: &user.username,
                email: &user.email,
                password: user.password_hash.as_str(),
                role_id: user.role_id.get(),
                is_active: false,
            };

            let row: UserRow = conn
                .transaction(|conn| {
                    async move {
                        let row: UserRow = diesel::insert_into(users::table)
                            .values(&new_row)
                            .returning(UserRow::as_returning())
                            .get_result(conn)
                            .await?;
                        diesel::insert_into(user_invitations::table)
                            .values(NewInvitationRow {
                                token: invitation.digest.as_str(),
                                user_id: row.id,
                                expires_at: invitation.expires_at,
                            })
                            .execute(conn)
                            .await?;
                        Ok(row)
                    }
                    .scope_boxed()
                })
                .await
                .map_err(map_diesel_error)?;
            User::try_from(row)
        })
        .await
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, StoreError> {
        with_deadline(&self.pool, "find user", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<UserRow> = users::table
                .find(id.get())
                .select(UserRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.ok_or_else(|| StoreError::not_found("user"))
                .and_then(User::try_from)
        })
        .await
    }

    async fn activate(
        &self,
        digest: &TokenDigest,
        now: DateTime<Utc>,
    ) -> Result<UserId, StoreError> {
        with_deadline(&self.pool, "activate user", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;

            let activated: Option<i64> = conn
                .transaction(|conn| {
                    async move {
                        let user_id: Option<i64> = user_invitations::table
                            .filter(
                                user_invitations::token
                                    .eq(digest.as_str())
                                    .and(user_invitations::expires_at.gt(now)),
                            )
                            .select(user_invitations::user_id)
                            .first(conn)
                            .await
                            .optional()?;
                        let Some(user_id) = user_id else {
                            return Ok(None);
                        };

                        diesel::update(users::table.find(user_id))
                            .set(users::is_active.eq(true))
                            .execute(conn)
                            .await?;
                        diesel::delete(
                            user_invitations::table.filter(user_invitations::user_id.eq(user_id)),
                        )
                        .execute(conn)
                        .await?;
                        Ok(Some(user_id))
                    }
                    .scope_boxed()
                })
                .await
                .map_err(map_diesel_error)?;

            let user_id = activated.ok_or_else(|| StoreError::not_found("invitation"))?;
            UserId::new(user_id).map_err(|err| StoreError::invalid_data(err.to_string()))
        })
        .await
    }
}
