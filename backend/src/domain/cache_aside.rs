//! Cache-aside reads over the entity store.
//!
//! The store is the source of truth. Reads consult the cache first, fall
//! back to the store on a miss and repopulate the cache best-effort. Writes
//! never repopulate: callers invalidate the affected key after a successful
//! store write, so a stale entry survives at most until its TTL elapses or
//! the next invalidation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::Error;
use super::ports::{CacheError, CacheKey, EntityCache};

/// Default lifetime of a cache entry.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// What a read does when the cache backend itself fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheReadPolicy {
    /// Log and fall through to the store.
    #[default]
    FailOpen,
    /// Surface the failure as [`super::ErrorCode::ServiceUnavailable`].
    FailClosed,
}

/// Cache reachability as reported by health probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Disabled,
    Ok,
    Unavailable,
}

/// Typed cache-aside reader shared by the domain services.
#[derive(Clone)]
pub struct CacheAside {
    cache: Option<Arc<dyn EntityCache>>,
    ttl: Duration,
    policy: CacheReadPolicy,
}

impl CacheAside {
    /// Read through `cache`, storing entries for `ttl`.
    pub fn new(cache: Arc<dyn EntityCache>, ttl: Duration) -> Self {
        Self {
            cache: Some(cache),
            ttl,
            policy: CacheReadPolicy::default(),
        }
    }

    /// A reader that always goes straight to the store.
    pub fn disabled() -> Self {
        Self {
            cache: None,
            ttl: DEFAULT_CACHE_TTL,
            policy: CacheReadPolicy::default(),
        }
    }

    /// Replace the failure policy for cache reads.
    #[must_use]
    pub fn with_policy(mut self, policy: CacheReadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cached value under `key`; `Ok(None)` on a miss or when disabled.
    pub async fn get<T>(&self, key: &CacheKey) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
    {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        match cache.get(key).await? {
            Some(payload) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(|err| CacheError::serialization(err.to_string())),
            None => Ok(None),
        }
    }

    /// Store `value` under `key` for `ttl`, or the configured default.
    pub async fn set<T>(&self, key: &CacheKey, value: &T, ttl: Option<Duration>) -> Result<(), CacheError>
    where
        T: Serialize + Sync,
    {
        let Some(cache) = &self.cache else {
            return Ok(());
        };
        let payload =
            serde_json::to_string(value).map_err(|err| CacheError::serialization(err.to_string()))?;
        cache.set(key, payload, ttl.unwrap_or(self.ttl)).await
    }

    /// Remove `key`. Failures are logged, never returned.
    pub async fn invalidate(&self, key: &CacheKey) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(error) = cache.delete(key).await {
            warn!(%key, %error, "cache invalidation failed");
        }
    }

    /// Return the cached value, or load it with `load` and cache it.
    ///
    /// Cache write failures never fail the read. Cache read failures follow
    /// the configured [`CacheReadPolicy`]. Undecodable entries count as a miss.
    pub async fn read<T, F, Fut>(&self, key: &CacheKey, load: F) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        match self.get::<T>(key).await {
            Ok(Some(value)) => {
                debug!(%key, "cache hit");
                return Ok(value);
            }
            Ok(None) => debug!(%key, "cache miss"),
            Err(error @ CacheError::Serialization { .. }) => {
                warn!(%key, %error, "discarding undecodable cache entry");
            }
            Err(error) => match self.policy {
                CacheReadPolicy::FailOpen => {
                    warn!(%key, %error, "cache read failed; falling back to store");
                }
                CacheReadPolicy::FailClosed => {
                    warn!(%key, %error, "cache read failed");
                    return Err(Error::service_unavailable("the cache is unavailable"));
                }
            },
        }

        let value = load().await?;
        if let Err(error) = self.set(key, &value, None).await {
            warn!(%key, %error, "cache write failed");
        }
        Ok(value)
    }

    /// Probe the cache backend.
    pub async fn status(&self) -> CacheStatus {
        let Some(cache) = &self.cache else {
            return CacheStatus::Disabled;
        };
        match cache.ping().await {
            Ok(()) => CacheStatus::Ok,
            Err(error) => {
                warn!(%error, "cache ping failed");
                CacheStatus::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockEntityCache;
    use mockall::predicate::{always, eq};
    use rstest::rstest;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: i64,
        name: String,
    }

    fn widget() -> Widget {
        Widget {
            id: 7,
            name: "sprocket".to_owned(),
        }
    }

    fn key() -> CacheKey {
        CacheKey::entity("widget", 7)
    }

    fn reader(mock: MockEntityCache) -> CacheAside {
        CacheAside::new(Arc::new(mock), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn hit_skips_loader() {
        let mut cache = MockEntityCache::new();
        let payload = serde_json::to_string(&widget()).expect("encode");
        cache
            .expect_get()
            .with(eq(key()))
            .times(1)
            .return_once(move |_| Ok(Some(payload)));
        cache.expect_set().never();

        let value: Widget = reader(cache)
            .read(&key(), || async { Err(Error::internal("loader must not run on a hit")) })
            .await
            .expect("cached value");
        assert_eq!(value, widget());
    }

    #[tokio::test]
    async fn miss_loads_and_populates_with_default_ttl() {
        let mut cache = MockEntityCache::new();
        cache.expect_get().times(1).return_once(|_| Ok(None));
        let expected_payload = serde_json::to_string(&widget()).expect("encode");
        cache
            .expect_set()
            .with(eq(key()), eq(expected_payload), eq(Duration::from_secs(60)))
            .times(1)
            .return_once(|_, _, _| Ok(()));

        let value = reader(cache)
            .read(&key(), || async { Ok(widget()) })
            .await
            .expect("loaded value");
        assert_eq!(value, widget());
    }

    #[tokio::test]
    async fn write_failure_does_not_fail_read() {
        let mut cache = MockEntityCache::new();
        cache.expect_get().return_once(|_| Ok(None));
        cache
            .expect_set()
            .return_once(|_, _, _| Err(CacheError::backend("connection reset")));

        let value = reader(cache)
            .read(&key(), || async { Ok(widget()) })
            .await
            .expect("read succeeds");
        assert_eq!(value, widget());
    }

    #[tokio::test]
    async fn fail_open_falls_through_to_store() {
        let mut cache = MockEntityCache::new();
        cache
            .expect_get()
            .return_once(|_| Err(CacheError::backend("connection refused")));
        cache.expect_set().return_once(|_, _, _| Ok(()));
        let loads = AtomicUsize::new(0);

        let value = reader(cache)
            .read(&key(), || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(widget())
            })
            .await
            .expect("store value");
        assert_eq!(value, widget());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fail_closed_surfaces_unavailable() {
        let mut cache = MockEntityCache::new();
        cache
            .expect_get()
            .return_once(|_| Err(CacheError::timeout("get")));

        let err = reader(cache)
            .with_policy(CacheReadPolicy::FailClosed)
            .read(&key(), || async { Ok(widget()) })
            .await
            .expect_err("fail closed");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn undecodable_entry_is_treated_as_miss() {
        let mut cache = MockEntityCache::new();
        cache
            .expect_get()
            .return_once(|_| Ok(Some("{not json".to_owned())));
        cache.expect_set().times(1).return_once(|_, _, _| Ok(()));

        let value = reader(cache)
            .with_policy(CacheReadPolicy::FailClosed)
            .read(&key(), || async { Ok(widget()) })
            .await
            .expect("reloaded");
        assert_eq!(value, widget());
    }

    #[tokio::test]
    async fn loader_errors_propagate_without_caching() {
        let mut cache = MockEntityCache::new();
        cache.expect_get().return_once(|_| Ok(None));
        cache.expect_set().never();

        let err = reader(cache)
            .read::<Widget, _, _>(&key(), || async { Err(Error::not_found("widget 7 not found")) })
            .await
            .expect_err("not found");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn invalidate_swallows_errors() {
        let mut cache = MockEntityCache::new();
        cache
            .expect_delete()
            .with(always())
            .times(1)
            .return_once(|_| Err(CacheError::backend("down")));
        reader(cache).invalidate(&key()).await;
    }

    #[rstest]
    #[tokio::test]
    async fn disabled_reader_always_loads() {
        let reader = CacheAside::disabled();
        assert_eq!(reader.get::<Widget>(&key()).await, Ok(None));
        assert_eq!(reader.status().await, CacheStatus::Disabled);
        let value = reader
            .read(&key(), || async { Ok(widget()) })
            .await
            .expect("loaded");
        assert_eq!(value, widget());
    }

    #[tokio::test]
    async fn status_reports_ping_failures() {
        let mut cache = MockEntityCache::new();
        cache
            .expect_ping()
            .return_once(|| Err(CacheError::backend("down")));
        assert_eq!(reader(cache).status().await, CacheStatus::Unavailable);
    }
}
