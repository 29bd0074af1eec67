//! Users API handlers.
//!
//! ```text
//! POST /api/v1/authentication/user {"username":"ada","email":"ada@example.com","password":"s3cret"}
//! PUT  /api/v1/users/activate/{token}
//! GET  /api/v1/users/feed?limit=10&sort=asc&tags=go,rust&search=async
//! GET  /api/v1/users/{id}
//! PUT  /api/v1/users/{id}/follow
//! PUT  /api/v1/users/{id}/unfollow
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use pagination::FeedQuery;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, FeedItem, InvitationToken, Registration, User, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::caller::Caller;
use crate::inbound::http::state::HttpState;

/// Registration body for `POST /api/v1/authentication/user`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Registration response: the inactive account and its activation token.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: User,
    pub token: String,
}

/// Register an inactive account and issue its activation token.
#[post("/authentication/user")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload.into_inner();
    let registration = Registration::new(username, email, password)?;
    let registered = state.users.register(registration).await?;
    Ok(HttpResponse::Created().json(RegisterResponse {
        user: registered.user,
        token: registered.token.expose().to_owned(),
    }))
}

/// Activate the account holding `token`.
#[put("/users/activate/{token}")]
pub async fn activate(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let token = InvitationToken::parse(&path.into_inner())?;
    state.users.activate(&token).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// The caller's feed. Registered before `/users/{id}` so `feed` never
/// parses as an id.
#[get("/users/feed")]
pub async fn feed(
    state: web::Data<HttpState>,
    caller: Caller,
    req: HttpRequest,
) -> ApiResult<web::Json<Vec<FeedItem>>> {
    let query = FeedQuery::from_query_str(req.query_string())
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    let items = state.posts.feed(caller.user_id(), &query).await?;
    Ok(web::Json(items))
}

/// Fetch a user profile.
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<User>> {
    let id = UserId::new(path.into_inner())?;
    Ok(web::Json(state.users.find(id).await?))
}

/// The caller follows `{id}`.
#[put("/users/{id}/follow")]
pub async fn follow(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let followed = UserId::new(path.into_inner())?;
    state.users.follow(caller.user_id(), followed).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// The caller unfollows `{id}`.
#[put("/users/{id}/unfollow")]
pub async fn unfollow(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let followed = UserId::new(path.into_inner())?;
    state.users.unfollow(caller.user_id(), followed).await?;
    Ok(HttpResponse::NoContent().finish())
}
