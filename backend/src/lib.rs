//! Social content service core.
//!
//! Hexagonal layout: [`domain`] holds entities, services and ports;
//! [`outbound`] implements the ports over PostgreSQL and Redis; [`inbound`]
//! exposes the HTTP surface and [`middleware`] carries request-scoped
//! concerns.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use middleware::{RateLimit, Trace};
pub use settings::AppSettings;
