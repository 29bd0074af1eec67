//! Posts and comments API handlers.
//!
//! ```text
//! POST   /api/v1/posts {"title":"Hello","content":"First","tags":["go"]}
//! GET    /api/v1/posts/{id}
//! PATCH  /api/v1/posts/{id} {"title":"Edited","version":1}
//! DELETE /api/v1/posts/{id}
//! POST   /api/v1/posts/{id}/comments {"content":"Nice"}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{NewComment, NewPost, Post, PostId, PostPatch, PostWithComments};
use crate::inbound::http::ApiResult;
use crate::inbound::http::caller::Caller;
use crate::inbound::http::state::HttpState;

/// Body for `POST /api/v1/posts`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body for `PATCH /api/v1/posts/{id}`: changed fields plus the version the
/// caller last read.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub version: u32,
}

/// Body for `POST /api/v1/posts/{id}/comments`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[post("/posts")]
pub async fn create_post(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<CreatePostRequest>,
) -> ApiResult<HttpResponse> {
    let CreatePostRequest {
        title,
        content,
        tags,
    } = payload.into_inner();
    let post = NewPost::new(caller.user_id(), title, content, tags)?;
    let created = state.posts.create(post).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Read a post with its comments. Served through the cache.
#[get("/posts/{id}")]
pub async fn get_post(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<PostWithComments>> {
    let id = PostId::new(path.into_inner())?;
    Ok(web::Json(state.posts.find_with_comments(id).await?))
}

/// Versioned partial update. A stale `version` answers 409.
#[patch("/posts/{id}")]
pub async fn update_post(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<i64>,
    payload: web::Json<UpdatePostRequest>,
) -> ApiResult<web::Json<Post>> {
    let id = PostId::new(path.into_inner())?;
    let UpdatePostRequest {
        title,
        content,
        tags,
        version,
    } = payload.into_inner();
    let patch = PostPatch {
        title,
        content,
        tags,
    };
    let updated = state
        .posts
        .update(caller.user_id(), id, patch, version)
        .await?;
    Ok(web::Json(updated))
}

#[delete("/posts/{id}")]
pub async fn delete_post(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let id = PostId::new(path.into_inner())?;
    state.posts.delete(caller.user_id(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/posts/{id}/comments")]
pub async fn create_comment(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<i64>,
    payload: web::Json<CreateCommentRequest>,
) -> ApiResult<HttpResponse> {
    let post_id = PostId::new(path.into_inner())?;
    let comment = NewComment::new(post_id, caller.user_id(), payload.into_inner().content)?;
    let created = state.posts.comment(comment).await?;
    Ok(HttpResponse::Created().json(created))
}
