//! In-memory entity cache and window counter with clock-driven expiry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{CacheError, CacheKey, CounterError, EntityCache, WindowCounter};

type SharedClock = Arc<dyn Clock + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn deadline(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Entity cache whose entries expire against the injected clock.
pub struct MemoryEntityCache {
    clock: SharedClock,
    entries: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
    sets: AtomicUsize,
}

impl MemoryEntityCache {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
            sets: AtomicUsize::new(0),
        }
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.utc();
        lock(&self.entries)
            .get(key)
            .is_some_and(|(_, expires_at)| *expires_at > now)
    }

    /// Number of successful writes so far.
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityCache for MemoryEntityCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let now = self.clock.utc();
        let mut entries = lock(&self.entries);
        match entries.get(key.as_str()) {
            Some((payload, expires_at)) if *expires_at > now => Ok(Some(payload.clone())),
            Some(_) => {
                entries.remove(key.as_str());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, payload: String, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = deadline(self.clock.utc(), ttl);
        lock(&self.entries).insert(key.as_str().to_owned(), (payload, expires_at));
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        lock(&self.entries).remove(key.as_str());
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Cache whose every call fails as an unreachable backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingEntityCache;

#[async_trait]
impl EntityCache for FailingEntityCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<String>, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn set(&self, _key: &CacheKey, _payload: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn delete(&self, _key: &CacheKey) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    expires_at: Option<DateTime<Utc>>,
}

/// Counter mirroring Redis `INCR`/`EXPIRE`/`TTL` semantics.
pub struct MemoryWindowCounter {
    clock: SharedClock,
    windows: Mutex<HashMap<String, Window>>,
}

impl MemoryWindowCounter {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn live(&self, windows: &mut HashMap<String, Window>, key: &str) -> Option<Window> {
        let now = self.clock.utc();
        match windows.get(key).copied() {
            Some(Window {
                expires_at: Some(at),
                ..
            }) if at <= now => {
                windows.remove(key);
                None
            }
            other => other,
        }
    }
}

#[async_trait]
impl WindowCounter for MemoryWindowCounter {
    async fn current(&self, key: &str) -> Result<Option<u64>, CounterError> {
        let mut windows = lock(&self.windows);
        Ok(self.live(&mut windows, key).map(|window| window.count))
    }

    async fn increment(&self, key: &str) -> Result<u64, CounterError> {
        let mut windows = lock(&self.windows);
        let mut window = self.live(&mut windows, key).unwrap_or(Window {
            count: 0,
            expires_at: None,
        });
        window.count += 1;
        windows.insert(key.to_owned(), window);
        Ok(window.count)
    }

    async fn expire(&self, key: &str, window: Duration) -> Result<(), CounterError> {
        let expires_at = deadline(self.clock.utc(), window);
        let mut windows = lock(&self.windows);
        if let Some(entry) = windows.get_mut(key) {
            entry.expires_at = Some(expires_at);
        }
        Ok(())
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, CounterError> {
        let now = self.clock.utc();
        let mut windows = lock(&self.windows);
        Ok(self
            .live(&mut windows, key)
            .and_then(|window| window.expires_at)
            .and_then(|at| (at - now).to_std().ok()))
    }
}

/// Counter whose every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingWindowCounter;

#[async_trait]
impl WindowCounter for FailingWindowCounter {
    async fn current(&self, _key: &str) -> Result<Option<u64>, CounterError> {
        Err(CounterError::backend("connection refused"))
    }

    async fn increment(&self, _key: &str) -> Result<u64, CounterError> {
        Err(CounterError::backend("connection refused"))
    }

    async fn expire(&self, _key: &str, _window: Duration) -> Result<(), CounterError> {
        Err(CounterError::backend("connection refused"))
    }

    async fn remaining_ttl(&self, _key: &str) -> Result<Option<Duration>, CounterError> {
        Err(CounterError::backend("connection refused"))
    }
}
