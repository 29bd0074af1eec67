//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports describe how the domain reaches the entity store, the side
//! cache and the rate limit counter. Every trait is object safe so adapters
//! can be injected as `Arc<dyn Port>`, and every trait gets a `mockall`
//! double in unit tests.

mod macros;
pub(crate) use macros::define_port_error;

mod cache_key;
mod comment_repository;
mod entity_cache;
mod feed_repository;
mod follower_repository;
mod post_repository;
mod rate_limiter;
mod role_repository;
mod store_error;
mod store_health;
mod user_repository;
mod window_counter;

pub use cache_key::CacheKey;
#[cfg(test)]
pub use comment_repository::MockCommentRepository;
pub use comment_repository::CommentRepository;
#[cfg(test)]
pub use entity_cache::MockEntityCache;
pub use entity_cache::{CacheError, EntityCache};
#[cfg(test)]
pub use feed_repository::MockFeedRepository;
pub use feed_repository::FeedRepository;
#[cfg(test)]
pub use follower_repository::MockFollowerRepository;
pub use follower_repository::FollowerRepository;
#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::PostRepository;
#[cfg(test)]
pub use rate_limiter::MockRateLimiter;
pub use rate_limiter::{FixtureRateLimiter, RateDecision, RateLimiter};
#[cfg(test)]
pub use role_repository::MockRoleRepository;
pub use role_repository::RoleRepository;
pub use store_error::StoreError;
#[cfg(test)]
pub use store_health::MockStoreHealth;
pub use store_health::{FixtureStoreHealth, StoreHealth};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::UserRepository;
#[cfg(test)]
pub use window_counter::MockWindowCounter;
pub use window_counter::{CounterError, WindowCounter};
