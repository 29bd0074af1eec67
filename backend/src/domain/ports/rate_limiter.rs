//! Driving port consulted by the HTTP layer before admitting a request.

use std::time::Duration;

use async_trait::async_trait;

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request may proceed.
    Allowed,
    /// The caller must wait `retry_after` before trying again.
    Denied { retry_after: Duration },
}

impl RateDecision {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Admission check keyed by client identity. Implementations never fail;
/// infrastructure trouble must resolve to a decision.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Decide whether `identity` may make another request now.
    async fn allow(&self, identity: &str) -> RateDecision;
}

/// Limiter that admits everything, used when rate limiting is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRateLimiter;

#[async_trait]
impl RateLimiter for FixtureRateLimiter {
    async fn allow(&self, _identity: &str) -> RateDecision {
        RateDecision::Allowed
    }
}
