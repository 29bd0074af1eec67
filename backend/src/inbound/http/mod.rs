//! HTTP inbound adapter exposing REST endpoints.

pub mod caller;
pub mod error;
pub mod health;
pub mod posts;
pub mod state;
pub mod users;

pub use error::ApiResult;

use actix_web::web;

use crate::domain::Error;

/// Register every `/api/v1` handler on `cfg`.
///
/// `users::feed` is registered before `users::get_user` so the literal
/// `/users/feed` segment wins over the `{id}` matcher.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(users::register)
        .service(users::activate)
        .service(users::feed)
        .service(users::get_user)
        .service(users::follow)
        .service(users::unfollow)
        .service(posts::create_post)
        .service(posts::get_post)
        .service(posts::update_post)
        .service(posts::delete_post)
        .service(posts::create_comment);
}

/// JSON extractor configuration answering malformed bodies with the domain
/// error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| Error::invalid_request(err.to_string()).into())
}
