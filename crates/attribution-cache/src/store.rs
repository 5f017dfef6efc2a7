//! `KvStore`: the backing abstraction the cache façade sits on top of.
//!
//! Grounded on `examples/original_source/attribution/internal/cache/redis.go`'s
//! `RedisCache`, generalized from a single Redis client to a trait so the
//! façade has no compile-time dependency on a particular store, and on the
//! teacher's `qa-pms-core/src/cache.rs` (`moka::future::Cache` usage).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use attribution_core::CoreError;
use bytes::Bytes;
use moka::future::Cache;
use moka::Expiry;

/// The minimal operations the cache façade needs from a backing store.
/// Implementors store opaque bytes; (de)serialization happens in the
/// façade, not here.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CoreError>;
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CoreError>;
    async fn delete(&self, key: &str) -> Result<(), CoreError>;
    /// All keys currently held by the store. The façade applies glob
    /// matching over this list; a store with many keys should keep this
    /// cheap (moka indexes live entries internally).
    async fn keys(&self) -> Result<Vec<String>, CoreError>;
    async fn len(&self) -> u64;
    /// Liveness probe. `Ok(latency)` when reachable.
    async fn ping(&self) -> Result<Duration, CoreError>;
}

struct PerEntryTtl;

impl Expiry<String, (Bytes, Duration)> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &(Bytes, Duration),
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(value.1)
    }
}

/// Production `KvStore`: an in-memory `moka` cache with per-entry TTL.
///
/// There is no external process to be "unreachable", so [`MokaStore::ping`]
/// always succeeds; it exists so the façade's health check and the
/// `UnavailableStore` test double share one interface.
#[derive(Clone)]
pub struct MokaStore {
    inner: Cache<String, (Bytes, Duration)>,
}

impl MokaStore {
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }
}

#[async_trait]
impl KvStore for MokaStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CoreError> {
        Ok(self.inner.get(key).await.map(|(bytes, _)| bytes))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CoreError> {
        self.inner.insert(key.to_string(), (value, ttl)).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CoreError> {
        self.inner.invalidate(key).await;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CoreError> {
        self.inner.run_pending_tasks().await;
        Ok(self.inner.iter().map(|(k, _)| k.as_ref().clone()).collect())
    }

    async fn len(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }

    async fn ping(&self) -> Result<Duration, CoreError> {
        Ok(Duration::from_millis(0))
    }
}

/// Test double that reports every operation as unavailable, exercising the
/// façade's `Unavailable`-then-fallback path (§4.2 policy: the cache never
/// propagates store errors to writes).
#[derive(Clone, Default)]
pub struct UnavailableStore;

#[async_trait]
impl KvStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CoreError> {
        Err(CoreError::Unavailable("store unreachable".into()))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CoreError> {
        Err(CoreError::Unavailable("store unreachable".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CoreError> {
        Err(CoreError::Unavailable("store unreachable".into()))
    }

    async fn keys(&self) -> Result<Vec<String>, CoreError> {
        Err(CoreError::Unavailable("store unreachable".into()))
    }

    async fn len(&self) -> u64 {
        0
    }

    async fn ping(&self) -> Result<Duration, CoreError> {
        Err(CoreError::Unavailable("store unreachable".into()))
    }
}

pub(crate) async fn timed_ping(store: &Arc<dyn KvStore>) -> Result<Duration, CoreError> {
    let start = Instant::now();
    store.ping().await?;
    Ok(start.elapsed())
}
