//! Rate limiting middleware guarding write endpoints.
//!
//! Requests whose method is in the guarded set are checked against the
//! shared [`RateLimiter`] keyed by the client IP. Denied requests never reach
//! the handler and answer 429 with a `Retry-After` header in whole seconds.
//! The limiter itself fails open, so a broken counter backend lets traffic
//! through.
//!
//! The client IP is the socket peer. `Forwarded` and `X-Forwarded-For` are
//! honoured only after [`RateLimit::trusting_forwarded_headers`], which
//! assumes a proxy in front that overwrites them; otherwise a client could
//! rotate the header to open a fresh window per request.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::Method;
use actix_web::http::header::{self, HeaderValue};
use actix_web::{Error, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::info;

use crate::domain::Error as DomainError;
use crate::domain::ports::{RateDecision, RateLimiter};

/// Identity used when the peer address is unknown.
const UNKNOWN_CLIENT: &str = "unknown";

/// Round `retry_after` up to whole seconds, never below one.
pub fn retry_after_seconds(retry_after: Duration) -> u64 {
    let whole = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    whole.max(1)
}

/// Rate limiting middleware.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use actix_web::App;
/// use social_backend::RateLimit;
/// use social_backend::domain::ports::FixtureRateLimiter;
///
/// let app = App::new().wrap(RateLimit::new(Arc::new(FixtureRateLimiter)));
/// ```
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<dyn RateLimiter>,
    methods: Rc<[Method]>,
    trust_forwarded: bool,
}

impl RateLimit {
    /// Guard `POST`, `PATCH` and `DELETE` requests.
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            limiter,
            methods: Rc::from([Method::POST, Method::PATCH, Method::DELETE]),
            trust_forwarded: false,
        }
    }

    /// Key on the client address reported by `Forwarded`/`X-Forwarded-For`.
    ///
    /// Only enable behind a proxy that sets these headers itself.
    #[must_use]
    pub fn trusting_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded = trust;
        self
    }

    /// Replace the guarded method set.
    #[must_use]
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limiter: Arc::clone(&self.limiter),
            methods: Rc::clone(&self.methods),
            trust_forwarded: self.trust_forwarded,
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
    methods: Rc<[Method]>,
    trust_forwarded: bool,
}

fn client_identity(req: &ServiceRequest, trust_forwarded: bool) -> String {
    if trust_forwarded {
        return req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or(UNKNOWN_CLIENT)
            .to_owned();
    }
    req.peer_addr()
        .map_or_else(|| UNKNOWN_CLIENT.to_owned(), |addr| addr.ip().to_string())
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !self.methods.contains(req.method()) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let identity = client_identity(&req, self.trust_forwarded);
        let limiter = Arc::clone(&self.limiter);
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match limiter.allow(&identity).await {
                RateDecision::Allowed => service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body),
                RateDecision::Denied { retry_after } => {
                    let seconds = retry_after_seconds(retry_after);
                    info!(%identity, retry_after_secs = seconds, "rate limit exceeded");
                    let mut response =
                        HttpResponse::from_error(DomainError::too_many_requests("rate limit exceeded"));
                    response
                        .headers_mut()
                        .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{FixtureRateLimiter, MockRateLimiter};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use actix_web::{App, web};
    use mockall::predicate::eq;
    use rstest::rstest;

    #[rstest]
    #[case(Duration::from_millis(1), 1)]
    #[case(Duration::ZERO, 1)]
    #[case(Duration::from_secs(59), 59)]
    #[case(Duration::from_millis(59_001), 60)]
    fn rounds_retry_after_up(#[case] retry_after: Duration, #[case] expected: u64) {
        assert_eq!(retry_after_seconds(retry_after), expected);
    }

    async fn call(limiter: Arc<dyn RateLimiter>, method: Method) -> ServiceResponse<EitherBody<actix_web::body::BoxBody>> {
        let req = actix_test::TestRequest::default().method(method);
        call_with(RateLimit::new(limiter), req).await
    }

    async fn call_with(
        rate_limit: RateLimit,
        req: actix_test::TestRequest,
    ) -> ServiceResponse<EitherBody<actix_web::body::BoxBody>> {
        let app = actix_test::init_service(
            App::new().wrap(rate_limit).route(
                "/",
                web::route().to(|| async { HttpResponse::Ok().finish() }),
            ),
        )
        .await;
        let req = req
            .uri("/")
            .peer_addr("10.0.0.7:4242".parse().expect("socket addr"))
            .to_request();
        actix_test::call_service(&app, req).await
    }

    #[actix_web::test]
    async fn denied_requests_get_429_with_retry_after() {
        let mut limiter = MockRateLimiter::new();
        limiter
            .expect_allow()
            .with(eq("10.0.0.7"))
            .times(1)
            .returning(|_| RateDecision::Denied {
                retry_after: Duration::from_millis(1500),
            });

        let res = call(Arc::new(limiter), Method::POST).await;

        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            res.headers()
                .get(header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok()),
            Some("2")
        );
    }

    #[actix_web::test]
    async fn forwarded_headers_are_ignored_by_default() {
        let mut limiter = MockRateLimiter::new();
        limiter
            .expect_allow()
            .with(eq("10.0.0.7"))
            .times(1)
            .returning(|_| RateDecision::Allowed);
        let req = actix_test::TestRequest::post()
            .insert_header(("x-forwarded-for", "203.0.113.9"));

        let res = call_with(RateLimit::new(Arc::new(limiter)), req).await;

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn forwarded_headers_key_the_window_when_trusted() {
        let mut limiter = MockRateLimiter::new();
        limiter
            .expect_allow()
            .with(eq("203.0.113.9"))
            .times(1)
            .returning(|_| RateDecision::Allowed);
        let req = actix_test::TestRequest::post()
            .insert_header(("x-forwarded-for", "203.0.113.9"));
        let rate_limit = RateLimit::new(Arc::new(limiter)).trusting_forwarded_headers(true);

        let res = call_with(rate_limit, req).await;

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn allowed_requests_reach_the_handler() {
        let res = call(Arc::new(FixtureRateLimiter), Method::DELETE).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn unguarded_methods_skip_the_limiter() {
        let mut limiter = MockRateLimiter::new();
        limiter.expect_allow().never();
        let res = call(Arc::new(limiter), Method::GET).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
