//! Rule table checks over single in-memory files.

use rstest::rstest;

use super::*;

fn lint_one(file: &str, contents: &str) -> Result<(), ArchitectureLintError> {
    lint_sources(&[LintSource::new(file, contents)])
}

fn messages(result: Result<(), ArchitectureLintError>) -> Vec<String> {
    match result {
        Ok(()) => Vec::new(),
        Err(ArchitectureLintError::Violations(violations)) => {
            violations.into_iter().map(|v| v.message).collect()
        }
        Err(other) => panic!("expected violations, got {other}"),
    }
}

#[rstest]
#[case("domain/post_service.rs", "use tokio::time::timeout; use tracing::info;")]
#[case("domain/cache_aside.rs", "use crate::domain::ports::{CacheKey, EntityCache};")]
#[case("domain/ports/store_error.rs", "use super::define_port_error;")]
#[case("inbound/http/posts.rs", "use actix_web::web; use crate::domain::PostService;")]
#[case("middleware/rate_limit.rs", "use crate::domain::ports::RateLimiter; use actix_web::HttpResponse;")]
#[case("outbound/cache/redis_entity_cache.rs", "use bb8_redis::redis::AsyncCommands; use crate::domain::ports::EntityCache;")]
#[case("outbound/persistence/pool.rs", "use diesel_async::pooled_connection::bb8::Pool;")]
#[case("server/state_builders.rs", "use social_backend::outbound::cache::RedisEntityCache; use actix_web::web;")]
#[case("settings.rs", "use ortho_config::OrthoConfig; fn f(settings: u8) { let _ = settings; }")]
#[case("test_support/memory_store.rs", "use crate::domain::ports::PostRepository; use pagination::FeedQuery;")]
fn permitted_dependencies_pass(#[case] file: &str, #[case] contents: &str) {
    assert_eq!(messages(lint_one(file, contents)), Vec::<String>::new());
}

#[rstest]
#[case("domain/post.rs", "use crate::inbound::http;", "domain must not reach into crate::inbound")]
#[case("domain/post.rs", "use crate::middleware::Trace;", "domain must not reach into crate::middleware")]
#[case("domain/user_service.rs", "use crate::settings::AppSettings;", "domain must not reach into crate::settings")]
#[case("domain/rate_limiter.rs", "fn f() { let _ = redis::cmd(\"INCR\"); }", "domain must not use Redis crate `redis`")]
#[case("domain/post.rs", "use actix_web::HttpResponse;", "domain must not use HTTP crate `actix_web`")]
#[case("inbound/http/users.rs", "use crate::outbound::persistence::DbPool;", "inbound must not reach into crate::outbound")]
#[case("inbound/http/users.rs", "use diesel::prelude::*;", "inbound must not use Postgres crate `diesel`")]
#[case("middleware/rate_limit.rs", "use bb8_redis::redis::AsyncCommands;", "middleware must not use Redis crate `bb8_redis`")]
#[case("outbound/cache/redis_pool.rs", "use actix_web::web;", "outbound must not use HTTP crate `actix_web`")]
#[case("outbound/persistence/diesel_helpers.rs", "use super::super::super::inbound::http;", "outbound must not reach into crate::inbound")]
#[case("server/mod.rs", "use social_backend::test_support::MemoryStore;", "server must not reach into crate::test_support")]
#[case("server/config.rs", "use diesel_async::AsyncPgConnection;", "server must not use Postgres crate `diesel_async`")]
#[case("settings.rs", "use crate::domain::UserId;", "settings must not reach into crate::domain")]
#[case("test_support/memory_cache.rs", "use crate::outbound::cache::RedisPool;", "test_support must not reach into crate::outbound")]
#[case("test_support/memory_cache.rs", "use bb8_redis::redis;", "test_support must not use Redis crate `bb8_redis`")]
fn crossings_are_named(#[case] file: &str, #[case] contents: &str, #[case] expected: &str) {
    assert_eq!(messages(lint_one(file, contents)), [expected.to_owned()]);
}

#[rstest]
fn each_offending_target_is_reported_once() {
    let result = lint_one(
        "domain/cache_aside.rs",
        "use redis::Cmd; use redis::Value; use diesel::prelude::*; \
         fn f() { let _ = redis::cmd(\"GET\"); }",
    );

    assert_eq!(
        messages(result),
        [
            "domain must not use Postgres crate `diesel`",
            "domain must not use Redis crate `redis`",
        ]
    );
}

#[rstest]
fn glob_imports_count_as_dependencies() {
    let result = lint_one("inbound/http/mod.rs", "use crate::outbound::*;");
    assert_eq!(messages(result), ["inbound must not reach into crate::outbound"]);
}

#[rstest]
fn local_bindings_named_like_modules_are_ignored() {
    let result = lint_one(
        "domain/post_service.rs",
        "fn f(server: u8, settings: u8) -> u8 { server + settings }",
    );
    assert!(result.is_ok(), "{result:?}");
}

#[rstest]
#[case("models/user.rs")]
#[case("doc.rs")]
fn files_outside_every_layer_are_unclassified(#[case] file: &str) {
    assert!(matches!(
        lint_one(file, "fn f() {}"),
        Err(ArchitectureLintError::Unclassified { .. })
    ));
}
