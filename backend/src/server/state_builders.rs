//! Builders wiring adapters into domain services and handler state.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::info;

use social_backend::domain::ports::{FixtureRateLimiter, RateLimiter};
use social_backend::domain::{
    CacheAside, CacheReadPolicy, FixedWindowRateLimiter, PostService, PostStores, UserService,
    UserStores,
};
use social_backend::inbound::http::health::HealthState;
use social_backend::inbound::http::state::HttpState;
use social_backend::outbound::cache::{RedisEntityCache, RedisWindowCounter};
use social_backend::outbound::persistence::{
    DieselCommentRepository, DieselFeedRepository, DieselFollowerRepository,
    DieselPostRepository, DieselRoleRepository, DieselStoreHealth, DieselUserRepository,
};

use super::ServerConfig;

/// Build the cache-aside reader, disabled when caching is off or Redis is
/// not configured.
pub(super) fn build_cache(config: &ServerConfig) -> CacheAside {
    let settings = &config.settings;
    match (&config.redis_pool, settings.cache_enabled()) {
        (Some(pool), true) => {
            let cache = RedisEntityCache::new(pool.clone())
                .with_ttl_jitter(settings.cache_ttl_jitter());
            let policy = if settings.cache_fail_closed {
                CacheReadPolicy::FailClosed
            } else {
                CacheReadPolicy::FailOpen
            };
            CacheAside::new(Arc::new(cache), settings.cache_ttl()).with_policy(policy)
        }
        _ => {
            info!("entity cache disabled");
            CacheAside::disabled()
        }
    }
}

/// Build the rate limiter, admitting everything when limiting is off.
pub(super) fn build_rate_limiter(config: &ServerConfig) -> Arc<dyn RateLimiter> {
    let settings = &config.settings;
    match (&config.redis_pool, settings.rate_limit_enabled()) {
        (Some(pool), true) => Arc::new(
            FixedWindowRateLimiter::new(
                Arc::new(RedisWindowCounter::new(pool.clone())),
                settings.rate_limit(),
                settings.rate_limit_window(),
            )
            .with_round_trip_timeout(settings.round_trip_timeout()),
        ),
        _ => {
            info!("rate limiting disabled");
            Arc::new(FixtureRateLimiter)
        }
    }
}

/// Build the post and user services over the Diesel adapters.
pub(super) fn build_http_state(config: &ServerConfig, cache: &CacheAside) -> web::Data<HttpState> {
    let pool = &config.db_pool;
    let posts = PostService::new(
        PostStores {
            posts: Arc::new(DieselPostRepository::new(pool.clone())),
            comments: Arc::new(DieselCommentRepository::new(pool.clone())),
            feed: Arc::new(DieselFeedRepository::new(pool.clone())),
            roles: Arc::new(DieselRoleRepository::new(pool.clone())),
            users: Arc::new(DieselUserRepository::new(pool.clone())),
        },
        cache.clone(),
    );
    let users = UserService::new(
        UserStores {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            roles: Arc::new(DieselRoleRepository::new(pool.clone())),
            followers: Arc::new(DieselFollowerRepository::new(pool.clone())),
        },
        cache.clone(),
        Arc::new(DefaultClock),
    )
    .with_invitation_ttl(config.settings.invitation_ttl());
    web::Data::new(HttpState::new(posts, users))
}

pub(super) fn build_health_state(config: &ServerConfig, cache: CacheAside) -> web::Data<HealthState> {
    web::Data::new(HealthState::new(
        Arc::new(DieselStoreHealth::new(config.db_pool.clone())),
        cache,
    ))
}
