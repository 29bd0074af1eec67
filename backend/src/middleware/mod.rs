//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns:
//! trace correlation and rate limiting.

pub mod rate_limit;
pub mod trace;

pub use rate_limit::RateLimit;
pub use trace::Trace;
