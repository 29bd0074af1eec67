//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the entity store ports
//! backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. No business logic resides here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are internal implementation details, never
//!   exposed to the domain layer.
//! - **Deadlines**: every operation runs under the pool's query timeout and
//!   reports expiry as `StoreError::Timeout`.
//! - **Strongly typed errors**: Driver errors are classified into
//!   `StoreError`; nothing is retried here.
//!
//! # Example
//!
//! ```ignore
//! use social_backend::outbound::persistence::{DbPool, PoolConfig, DieselPostRepository};
//!
//! let config = PoolConfig::new("postgres://localhost/social");
//! let pool = DbPool::new(config).await?;
//! let repo = DieselPostRepository::new(pool);
//! ```

mod diesel_comment_repository;
mod diesel_feed_repository;
mod diesel_follower_repository;
pub(crate) mod diesel_helpers;
mod diesel_post_repository;
mod diesel_role_repository;
mod diesel_store_health;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_comment_repository::DieselCommentRepository;
pub use diesel_feed_repository::DieselFeedRepository;
pub use diesel_follower_repository::DieselFollowerRepository;
pub use diesel_post_repository::DieselPostRepository;
pub use diesel_role_repository::DieselRoleRepository;
pub use diesel_store_health::DieselStoreHealth;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DEFAULT_QUERY_TIMEOUT, DbPool, PoolConfig, PoolError};
