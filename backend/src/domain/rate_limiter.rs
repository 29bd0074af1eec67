//! Distributed fixed-window rate limiter.
//!
//! Each client identity owns one counter key, `rate_limit:<identity>`, that
//! lives for one window after its first increment. Requests are admitted
//! while the counter is below the limit.
//!
//! # Fail-open
//!
//! Any counter failure or round-trip timeout admits the request. The
//! limiter protects the store from bursts; it must never take the service
//! down because its own backend is unavailable. Every such admission is
//! logged at `warn`.
//!
//! Adjacent windows can together admit up to twice the limit. That is the
//! accepted cost of a fixed window.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ports::{CounterError, RateDecision, RateLimiter, WindowCounter};

/// Default round-trip budget for one limiter check.
pub const DEFAULT_ROUND_TRIP_TIMEOUT: Duration = Duration::from_secs(5);

/// Counter key for `identity`.
pub fn window_key(identity: &str) -> String {
    format!("rate_limit:{identity}")
}

/// Fixed-window limiter over a shared [`WindowCounter`].
#[derive(Clone)]
pub struct FixedWindowRateLimiter {
    counter: Arc<dyn WindowCounter>,
    limit: u64,
    window: Duration,
    round_trip_timeout: Duration,
}

impl FixedWindowRateLimiter {
    /// Admit `limit` requests per identity per `window`.
    pub fn new(counter: Arc<dyn WindowCounter>, limit: u64, window: Duration) -> Self {
        Self {
            counter,
            limit,
            window,
            round_trip_timeout: DEFAULT_ROUND_TRIP_TIMEOUT,
        }
    }

    /// Bound the time one check may spend talking to the counter backend.
    #[must_use]
    pub fn with_round_trip_timeout(mut self, timeout: Duration) -> Self {
        self.round_trip_timeout = timeout;
        self
    }

    async fn check(&self, key: &str) -> Result<RateDecision, CounterError> {
        let current = self.counter.current(key).await?.unwrap_or(0);
        if current >= self.limit {
            return self.deny(key).await;
        }

        let count = self.counter.increment(key).await?;
        if count == 1 {
            // Only the request that opens the window sets its expiry.
            self.counter.expire(key, self.window).await?;
        }
        if count > self.limit {
            // Lost a race with concurrent incrementers.
            return self.deny(key).await;
        }
        Ok(RateDecision::Allowed)
    }

    async fn deny(&self, key: &str) -> Result<RateDecision, CounterError> {
        let retry_after = match self.counter.remaining_ttl(key).await? {
            Some(ttl) if !ttl.is_zero() => ttl,
            _ => {
                // The expiry was lost (for example the opening EXPIRE failed);
                // restart the window so the key cannot block forever.
                self.counter.expire(key, self.window).await?;
                self.window
            }
        };
        Ok(RateDecision::Denied { retry_after })
    }
}

#[async_trait]
impl RateLimiter for FixedWindowRateLimiter {
    async fn allow(&self, identity: &str) -> RateDecision {
        let key = window_key(identity);
        match tokio::time::timeout(self.round_trip_timeout, self.check(&key)).await {
            Ok(Ok(decision)) => {
                if let RateDecision::Denied { retry_after } = decision {
                    debug!(%key, retry_after_ms = retry_after.as_millis(), "rate limit exceeded");
                }
                decision
            }
            Ok(Err(error)) => {
                warn!(%key, %error, "rate limiter backend failed; allowing request");
                RateDecision::Allowed
            }
            Err(_) => {
                warn!(
                    %key,
                    timeout_ms = self.round_trip_timeout.as_millis(),
                    "rate limiter timed out; allowing request"
                );
                RateDecision::Allowed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockWindowCounter;
    use mockall::predicate::eq;
    use rstest::rstest;

    const WINDOW: Duration = Duration::from_secs(60);

    fn limiter(counter: MockWindowCounter, limit: u64) -> FixedWindowRateLimiter {
        FixedWindowRateLimiter::new(Arc::new(counter), limit, WINDOW)
    }

    #[rstest]
    fn keys_are_prefixed() {
        assert_eq!(window_key("10.0.0.1"), "rate_limit:10.0.0.1");
    }

    #[tokio::test]
    async fn first_request_opens_window() {
        let mut counter = MockWindowCounter::new();
        counter.expect_current().return_once(|_| Ok(None));
        counter
            .expect_increment()
            .with(eq("rate_limit:ip"))
            .return_once(|_| Ok(1));
        counter
            .expect_expire()
            .with(eq("rate_limit:ip"), eq(WINDOW))
            .times(1)
            .return_once(|_, _| Ok(()));

        assert_eq!(limiter(counter, 3).allow("ip").await, RateDecision::Allowed);
    }

    #[tokio::test]
    async fn later_requests_do_not_extend_window() {
        let mut counter = MockWindowCounter::new();
        counter.expect_current().return_once(|_| Ok(Some(1)));
        counter.expect_increment().return_once(|_| Ok(2));
        counter.expect_expire().never();

        assert!(limiter(counter, 3).allow("ip").await.is_allowed());
    }

    #[tokio::test]
    async fn exhausted_window_reports_remaining_ttl() {
        let mut counter = MockWindowCounter::new();
        counter.expect_current().return_once(|_| Ok(Some(3)));
        counter.expect_increment().never();
        counter
            .expect_remaining_ttl()
            .return_once(|_| Ok(Some(Duration::from_secs(12))));

        assert_eq!(
            limiter(counter, 3).allow("ip").await,
            RateDecision::Denied {
                retry_after: Duration::from_secs(12)
            }
        );
    }

    #[tokio::test]
    async fn lost_expiry_is_restored_on_denial() {
        let mut counter = MockWindowCounter::new();
        counter.expect_current().return_once(|_| Ok(Some(5)));
        counter.expect_remaining_ttl().return_once(|_| Ok(None));
        counter
            .expect_expire()
            .with(eq("rate_limit:ip"), eq(WINDOW))
            .times(1)
            .return_once(|_, _| Ok(()));

        assert_eq!(
            limiter(counter, 3).allow("ip").await,
            RateDecision::Denied { retry_after: WINDOW }
        );
    }

    #[tokio::test]
    async fn concurrent_overshoot_is_denied() {
        let mut counter = MockWindowCounter::new();
        counter.expect_current().return_once(|_| Ok(Some(2)));
        counter.expect_increment().return_once(|_| Ok(4));
        counter
            .expect_remaining_ttl()
            .return_once(|_| Ok(Some(Duration::from_secs(30))));

        assert!(!limiter(counter, 3).allow("ip").await.is_allowed());
    }

    #[rstest]
    #[case::read_fails(true)]
    #[case::ttl_read_fails(false)]
    #[tokio::test]
    async fn backend_failures_fail_open(#[case] fail_on_read: bool) {
        let mut counter = MockWindowCounter::new();
        if fail_on_read {
            counter
                .expect_current()
                .return_once(|_| Err(CounterError::backend("connection refused")));
        } else {
            counter.expect_current().return_once(|_| Ok(Some(100)));
            counter
                .expect_remaining_ttl()
                .return_once(|_| Err(CounterError::backend("connection reset")));
        }

        assert_eq!(limiter(counter, 3).allow("ip").await, RateDecision::Allowed);
    }

    struct StalledCounter;

    #[async_trait]
    impl WindowCounter for StalledCounter {
        async fn current(&self, _key: &str) -> Result<Option<u64>, CounterError> {
            std::future::pending().await
        }

        async fn increment(&self, _key: &str) -> Result<u64, CounterError> {
            std::future::pending().await
        }

        async fn expire(&self, _key: &str, _window: Duration) -> Result<(), CounterError> {
            std::future::pending().await
        }

        async fn remaining_ttl(&self, _key: &str) -> Result<Option<Duration>, CounterError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_backend_fails_open_after_timeout() {
        let limiter = FixedWindowRateLimiter::new(Arc::new(StalledCounter), 1, WINDOW)
            .with_round_trip_timeout(Duration::from_millis(50));
        assert_eq!(limiter.allow("ip").await, RateDecision::Allowed);
    }
}
