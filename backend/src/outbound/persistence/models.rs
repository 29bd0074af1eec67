//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types validate
//! identifiers and counters, reporting corrupt rows as `InvalidData`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Array, BigInt, Int4, Text, Timestamptz, Varchar};

use crate::domain::ports::StoreError;
use crate::domain::{
    Comment, CommentId, FeedItem, Post, PostId, Role, RoleId, User, UserId,
};

use super::diesel_helpers::{cast_count, cast_version};
use super::schema::{comments, posts, roles, user_invitations, users};

fn invalid<E: std::fmt::Display>(err: E) -> StoreError {
    StoreError::invalid_data(err.to_string())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role_id: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(row.id).map_err(invalid)?,
            username: row.username,
            email: row.email,
            role_id: RoleId::new(row.role_id).map_err(invalid)?,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role_id: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_invitations)]
pub(crate) struct NewInvitationRow<'a> {
    pub token: &'a str,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RoleRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub level: i32,
}

impl TryFrom<RoleRow> for Role {
    type Error = StoreError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RoleId::new(row.id).map_err(invalid)?,
            name: row.name,
            description: row.description,
            level: row.level,
        })
    }
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

impl TryFrom<PostRow> for Post {
    type Error = StoreError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PostId::new(row.id).map_err(invalid)?,
            user_id: UserId::new(row.user_id).map_err(invalid)?,
            title: row.title,
            content: row.content,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: cast_version(row.version)?,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub(crate) struct NewPostRow<'a> {
    pub user_id: i64,
    pub title: &'a str,
    pub content: &'a str,
    pub tags: &'a [String],
    pub version: i32,
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentRow {
    pub(crate) fn into_comment(self, username: String) -> Result<Comment, StoreError> {
        Ok(Comment {
            id: CommentId::new(self.id).map_err(invalid)?,
            post_id: PostId::new(self.post_id).map_err(invalid)?,
            user_id: UserId::new(self.user_id).map_err(invalid)?,
            username,
            content: self.content,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub(crate) struct NewCommentRow<'a> {
    pub post_id: i64,
    pub user_id: i64,
    pub content: &'a str,
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// Row produced by the raw feed query.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct FeedRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = BigInt)]
    pub user_id: i64,
    #[diesel(sql_type = Varchar)]
    pub title: String,
    #[diesel(sql_type = Text)]
    pub content: String,
    #[diesel(sql_type = Array<Text>)]
    pub tags: Vec<String>,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    pub updated_at: DateTime<Utc>,
    #[diesel(sql_type = Int4)]
    pub version: i32,
    #[diesel(sql_type = Varchar)]
    pub username: String,
    #[diesel(sql_type = BigInt)]
    pub comments_count: i64,
}

impl TryFrom<FeedRow> for FeedItem {
    type Error = StoreError;

    fn try_from(row: FeedRow) -> Result<Self, Self::Error> {
        let post = Post::try_from(PostRow {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            content: row.content,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })?;
        Ok(Self {
            post,
            username: row.username,
            comments_count: cast_count(row.comments_count)?,
        })
    }
}
