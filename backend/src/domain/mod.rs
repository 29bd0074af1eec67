//! Domain primitives, ports and use-case services.
//!
//! Purpose: Define strongly typed entities and the services that orchestrate
//! stores, the entity cache and the rate limiter. Adapters live in
//! `outbound`; HTTP translation lives in `inbound`.
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable identifiers.
//! - Post, User, Comment, Role, FollowEdge, FeedItem: entities.
//! - CacheAside: typed read-through cache over the `EntityCache` port.
//! - FixedWindowRateLimiter: fail-open limiter over the `WindowCounter` port.
//! - PostService / UserService: use-cases shared by the handlers.

pub mod cache_aside;
pub mod comment;
pub mod error;
pub mod feed;
pub mod follow;
pub mod ids;
pub mod invitation;
pub mod password;
pub mod ports;
pub mod post;
pub mod post_service;
pub mod rate_limiter;
pub mod role;
mod store_error_mapping;
pub mod trace_id;
pub mod user;
pub mod user_service;

pub use self::cache_aside::{CacheAside, CacheReadPolicy, CacheStatus, DEFAULT_CACHE_TTL};
pub use self::comment::{Comment, CommentValidationError, NewComment};
pub use self::error::{Error, ErrorCode};
pub use self::feed::FeedItem;
pub use self::follow::FollowEdge;
pub use self::ids::{CommentId, IdValidationError, PostId, RoleId, UserId};
pub use self::invitation::{Invitation, InvitationToken, TokenDigest};
pub use self::password::{PasswordHash, PasswordHashError};
pub use self::post::{NewPost, Post, PostPatch, PostUpdate, PostValidationError};
pub use self::post_service::{PostService, PostStores, PostWithComments};
pub use self::rate_limiter::FixedWindowRateLimiter;
pub use self::role::{Actor, Role, authorize_post_mutation};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{NewUser, Registration, RegistrationValidationError, User};
pub use self::user_service::{RegisteredUser, UserService, UserStores};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use social_backend::domain::{ApiResult, Error};
///
/// fn guard(owner: bool) -> ApiResult<()> {
///     if owner { Ok(()) } else { Err(Error::forbidden("not your post")) }
/// }
/// assert!(guard(true).is_ok());
/// ```
pub type ApiResult<T> = Result<T, Error>;
