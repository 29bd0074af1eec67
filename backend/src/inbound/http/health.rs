//! Health endpoints: liveness & readiness probes for orchestration and load balancers.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use tracing::warn;

use crate::domain::ports::StoreHealth;
use crate::domain::{CacheAside, CacheStatus};

/// Shared health state for readiness and liveness checks.
/// Track readiness and whether the process should report itself as alive to orchestrators.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    store: Arc<dyn StoreHealth>,
    cache: CacheAside,
}

/// Readiness report body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub started: bool,
    pub store: ProbeStatus,
    pub cache: CacheStatus,
}

/// Outcome of a dependency probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Ok,
    Unavailable,
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new(store: Arc<dyn StoreHealth>, cache: CacheAside) -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            store,
            cache,
        }
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Return readiness state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return liveness state. When false, liveness probes emit 503 to trigger restarts.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Probe dependencies. The cache is reported but never gates readiness.
    pub async fn readiness(&self) -> ReadinessReport {
        let store = match self.store.check().await {
            Ok(()) => ProbeStatus::Ok,
            Err(err) => {
                warn!(error = %err, "store health check failed");
                ProbeStatus::Unavailable
            }
        };
        ReadinessReport {
            started: self.is_ready(),
            store,
            cache: self.cache.status().await,
        }
    }

    fn probe_response(probe_ok: bool) -> actix_web::HttpResponseBuilder {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };
        response.insert_header((header::CACHE_CONTROL, "no-store"));
        response
    }
}

impl ReadinessReport {
    /// Ready once started with a reachable store.
    pub fn is_ready(&self) -> bool {
        self.started && self.store == ProbeStatus::Ok
    }
}

/// Readiness probe. Return 200 when started and the store answers; 503 otherwise.
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    let report = state.readiness().await;
    HealthState::probe_response(report.is_ready()).json(report)
}

/// Liveness probe. Return 200 while the process is marked alive and 503 once draining.
/// Call `HealthState::mark_unhealthy` before graceful shutdown to surface the drain early.
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive()).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{FixtureStoreHealth, MockStoreHealth, StoreError};
    use actix_web::{App, http::StatusCode, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;

    async fn probe(state: HealthState, uri: &str) -> (StatusCode, Vec<u8>) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(ready)
                .service(live),
        )
        .await;
        let response =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request())
                .await;
        let status = response.status();
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|value| value.to_str().ok()),
            Some("no-store")
        );
        (status, actix_test::read_body(response).await.to_vec())
    }

    #[rstest]
    #[actix_web::test]
    async fn not_ready_before_start() {
        let state = HealthState::new(Arc::new(FixtureStoreHealth), CacheAside::disabled());
        let (status, _) = probe(state, "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[rstest]
    #[actix_web::test]
    async fn ready_reports_dependencies() {
        let state = HealthState::new(Arc::new(FixtureStoreHealth), CacheAside::disabled());
        state.mark_ready();
        let (status, body) = probe(state, "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(value["store"], "ok");
        assert_eq!(value["cache"], "disabled");
    }

    #[rstest]
    #[actix_web::test]
    async fn unreachable_store_fails_readiness() {
        let mut store = MockStoreHealth::new();
        store
            .expect_check()
            .returning(|| Err(StoreError::connection("refused")));
        let state = HealthState::new(Arc::new(store), CacheAside::disabled());
        state.mark_ready();
        let (status, body) = probe(state, "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let value: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(value["store"], "unavailable");
    }

    #[rstest]
    #[actix_web::test]
    async fn liveness_flips_when_draining() {
        let state = HealthState::new(Arc::new(FixtureStoreHealth), CacheAside::disabled());
        state.mark_unhealthy();
        let (status, _) = probe(state, "/health/live").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
