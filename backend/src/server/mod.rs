//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use social_backend::domain::ports::RateLimiter;
use social_backend::inbound::http::configure_api;
use social_backend::inbound::http::health::{HealthState, live, ready};
use social_backend::inbound::http::state::HttpState;
use social_backend::{RateLimit, Trace};
use state_builders::{build_cache, build_health_state, build_http_state, build_rate_limiter};

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    limiter: Arc<dyn RateLimiter>,
    trust_forwarded_headers: bool,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        limiter,
        trust_forwarded_headers,
    } = deps;

    let api = web::scope("/api/v1")
        .wrap(RateLimit::new(limiter).trusting_forwarded_headers(trust_forwarded_headers))
        .configure(configure_api);

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live)
}

/// Construct an Actix HTTP server from `config`.
///
/// # Returns
/// The health state shared with the probes, and a [`Server`] that must be
/// awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(config: ServerConfig) -> std::io::Result<(web::Data<HealthState>, Server)> {
    let cache = build_cache(&config);
    let limiter = build_rate_limiter(&config);
    let http_state = build_http_state(&config, &cache);
    let health_state = build_health_state(&config, cache);
    let server_health_state = health_state.clone();
    let trust_forwarded_headers = config.settings.trust_forwarded_headers;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            limiter: Arc::clone(&limiter),
            trust_forwarded_headers,
        })
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok((health_state, server))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use mockable::Clock;
    use social_backend::domain::ports::{FixtureRateLimiter, StoreHealth};
    use social_backend::domain::{CacheAside, FixedWindowRateLimiter, PostService, UserService};
    use social_backend::test_support::{MemoryStore, MemoryWindowCounter, MutableClock};
    use std::time::Duration;

    fn deps(limiter: Arc<dyn RateLimiter>, trust_forwarded_headers: bool) -> AppDependencies {
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MutableClock::at_epoch());
        let store = Arc::new(MemoryStore::new(Arc::clone(&clock)));
        let posts = PostService::new(store.post_stores(), CacheAside::disabled());
        let users = UserService::new(store.user_stores(), CacheAside::disabled(), clock);
        let health: Arc<dyn StoreHealth> = store;
        AppDependencies {
            health_state: web::Data::new(HealthState::new(health, CacheAside::disabled())),
            http_state: web::Data::new(HttpState::new(posts, users)),
            limiter,
            trust_forwarded_headers,
        }
    }

    fn one_write_per_minute() -> Arc<dyn RateLimiter> {
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MutableClock::at_epoch());
        Arc::new(FixedWindowRateLimiter::new(
            Arc::new(MemoryWindowCounter::new(clock)),
            1,
            Duration::from_secs(60),
        ))
    }

    fn register(forwarded_for: &str) -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri("/api/v1/authentication/user")
            .peer_addr("198.51.100.4:9000".parse().expect("peer addr"))
            .insert_header(("x-forwarded-for", forwarded_for))
            .set_json(serde_json::json!({"username": "", "email": "", "password": ""}))
    }

    #[actix_web::test]
    async fn assembled_app_serves_probes_and_api() {
        let app = actix_test::init_service(build_app(deps(Arc::new(FixtureRateLimiter), false))).await;

        let live_req = actix_test::TestRequest::get().uri("/health/live").to_request();
        assert_eq!(actix_test::call_service(&app, live_req).await.status(), StatusCode::OK);

        let missing = actix_test::TestRequest::get().uri("/api/v1/users/1").to_request();
        let res = actix_test::call_service(&app, missing).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().contains_key("trace-id"));
    }

    #[actix_web::test]
    async fn rotating_forwarded_for_shares_the_peer_window() {
        let app = actix_test::init_service(build_app(deps(one_write_per_minute(), false))).await;

        let first = actix_test::call_service(&app, register("203.0.113.1").to_request()).await;
        let second = actix_test::call_service(&app, register("203.0.113.2").to_request()).await;

        assert_eq!(first.status(), StatusCode::BAD_REQUEST);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[actix_web::test]
    async fn trusted_forwarded_for_keys_each_client() {
        let app = actix_test::init_service(build_app(deps(one_write_per_minute(), true))).await;

        let first = actix_test::call_service(&app, register("203.0.113.1").to_request()).await;
        let second = actix_test::call_service(&app, register("203.0.113.2").to_request()).await;

        assert_eq!(first.status(), StatusCode::BAD_REQUEST);
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    }
}
