//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;

use crate::domain::{PostService, UserService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub posts: Arc<PostService>,
    pub users: Arc<UserService>,
}

impl HttpState {
    /// Bundle the domain services.
    pub fn new(posts: PostService, users: UserService) -> Self {
        Self {
            posts: Arc::new(posts),
            users: Arc::new(users),
        }
    }
}
