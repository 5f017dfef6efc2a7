//! `CacheFacade`: the key-prefixed adapter over a [`KvStore`] (§4.2).
//!
//! Grounded on `examples/original_source/attribution/internal/cache/redis.go`'s
//! `RedisCache` (method set, "silent success when unavailable" policy) with
//! single-flight `GetOrSet` coordination modeled on
//! `examples/other_examples/manifests/thichuong-multi-tier-cache`'s
//! stampede-protection design.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use attribution_core::health::{HealthCheck, HealthCheckResult};
use attribution_core::CoreError;
use attribution_metrics::MetricsCollector;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::store::{timed_ping, KvStore};

/// Whether [`CacheFacade::get_or_set`] served a cached value or ran `fetch`.
/// The source treats any non-error `GetOrSet` return as a cache hit even
/// when it fell through to `fetch`; distinguished here so telemetry can
/// label the two cases separately (§9 open question).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Filled,
}

/// `GetStats()` response (§4.2): hits, misses, hit rate, approximate key
/// count, memory, uptime, connected flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub key_count: u64,
    pub memory_mb: f64,
    pub uptime_seconds: i64,
    pub connected: bool,
}

/// Per-key coordination slot for [`CacheFacade::get_or_set`]'s single-flight
/// guarantee: the first caller to observe a miss becomes the leader and runs
/// `fetch`; later callers for the same key wait on `notify` and then read
/// `result`.
///
/// `result` holding a serialized `(Bytes, ttl-tag)` rather than a typed value
/// is what lets one `InflightSlot` serve callers asking for different `T` —
/// in practice a given key is always fetched as the same type, but the
/// façade doesn't need to assume that.
#[derive(Default)]
struct InflightSlot {
    notify: Notify,
    result: OnceLock<Result<Bytes, String>>,
}

/// Key-prefixed cache façade (§4.2).
#[derive(Clone)]
pub struct CacheFacade {
    store: Arc<dyn KvStore>,
    prefix: String,
    default_ttl: Duration,
    metrics: MetricsCollector,
    inflight: Arc<DashMap<String, Arc<InflightSlot>>>,
}

impl CacheFacade {
    #[must_use]
    pub fn new(
        store: Arc<dyn KvStore>,
        prefix: impl Into<String>,
        default_ttl: Duration,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            default_ttl,
            metrics,
            inflight: Arc::new(DashMap::new()),
        }
    }

    /// The TTL used by callers that don't specify one explicitly.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    /// Fails with [`CoreError::Miss`] if absent, [`CoreError::Unavailable`]
    /// if the store is unreachable, [`CoreError::Decode`] if the stored
    /// value doesn't deserialize into `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, CoreError> {
        let full = self.full_key(key);
        match self.store.get(&full).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => {
                    self.metrics.record_cache_hit();
                    Ok(value)
                }
                Err(e) => Err(CoreError::Decode(e.to_string())),
            },
            Ok(None) => {
                self.metrics.record_cache_miss();
                Err(CoreError::Miss)
            }
            Err(err) => Err(err),
        }
    }

    /// Silent success when the store is unavailable; serialization failure
    /// is still reported.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| CoreError::Decode(e.to_string()))?;
        let full = self.full_key(key);
        match self.store.set(&full, bytes, ttl).await {
            Ok(()) | Err(CoreError::Unavailable(_)) => Ok(()),
            Err(other) => Err(other),
        }
    }

    /// Fails with [`CoreError::Unavailable`] on store error.
    pub async fn delete(&self, key: &str) -> Result<(), CoreError> {
        let full = self.full_key(key);
        self.store.delete(&full).await
    }

    /// Expands `pattern` against the logical (unprefixed) key space and
    /// deletes every match. Returns the number of keys removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BadRequest`] for a malformed glob, or
    /// [`CoreError::Unavailable`] on store error.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CoreError> {
        let matcher =
            glob::Pattern::new(pattern).map_err(|e| CoreError::BadRequest(e.to_string()))?;
        let keys = self.store.keys().await?;
        let mut deleted = 0usize;
        for full_key in keys {
            let Some(logical) = full_key.strip_prefix(&self.prefix) else {
                continue;
            };
            if matcher.matches(logical) {
                self.store.delete(&full_key).await?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Returns the cached value on hit. On miss, runs `fetch`, caches the
    /// result with `ttl`, and returns it. At most one in-flight `fetch` runs
    /// per key across the whole process; concurrent callers for the same key
    /// wait for and share that result. If the store is unreachable, `fetch`
    /// still runs (once, via the same single-flight path) but its result is
    /// never cached.
    pub async fn get_or_set<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<(T, CacheOutcome), CoreError>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, CoreError>> + Send,
    {
        let cacheable = match self.get::<T>(key).await {
            Ok(value) => return Ok((value, CacheOutcome::Hit)),
            Err(CoreError::Unavailable(_)) => false,
            Err(CoreError::Miss | CoreError::Decode(_)) => true,
            Err(other) => return Err(other),
        };

        let (slot, is_leader) = match self.inflight.entry(key.to_string()) {
            Entry::Occupied(occupied) => (occupied.get().clone(), false),
            Entry::Vacant(vacant) => {
                let slot = Arc::new(InflightSlot::default());
                vacant.insert(slot.clone());
                (slot, true)
            }
        };

        if is_leader {
            let outcome = fetch().await;
            let wire = match &outcome {
                Ok(value) => serde_json::to_vec(value)
                    .map(Bytes::from)
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            // Leader publishes the result, then clears the slot so the next
            // miss for this key starts a fresh fetch rather than replaying
            // this one.
            let _ = slot.result.set(wire);
            self.inflight.remove(key);
            slot.notify.notify_waiters();

            let value = outcome?;
            if cacheable {
                let _ = self.set(key, &value, ttl).await;
            }
            Ok((value, CacheOutcome::Filled))
        } else {
            let notified = slot.notify.notified();
            if slot.result.get().is_none() {
                notified.await;
            }
            let value = match slot.result.get() {
                Some(Ok(bytes)) => {
                    serde_json::from_slice::<T>(bytes).map_err(|e| CoreError::Decode(e.to_string()))
                }
                Some(Err(message)) => Err(CoreError::Internal(anyhow::anyhow!(message.clone()))),
                None => Err(CoreError::Internal(anyhow::anyhow!(
                    "single-flight leader produced no result"
                ))),
            }?;
            Ok((value, CacheOutcome::Filled))
        }
    }

    /// Pipelined/batched best-effort write: failures are logged and do not
    /// abort the remaining items.
    pub async fn set_multiple<T: Serialize>(&self, items: &HashMap<String, T>, ttl: Duration) {
        for (key, value) in items {
            if let Err(err) = self.set(key, value, ttl).await {
                tracing::warn!(%key, %err, "set_multiple: failed to cache entry");
            }
        }
    }

    /// Pre-populates sentinel entries for `keys` with a short TTL.
    pub async fn warm_up(&self, keys: &[String]) {
        const WARM_TTL: Duration = Duration::from_secs(300);
        for key in keys {
            let sentinel = format!("{key}_warming");
            let _ = self.set(&sentinel, &true, WARM_TTL).await;
        }
    }

    /// `{hits, misses, hit_rate, key_count, memory_mb, uptime_seconds,
    /// connected}`.
    pub async fn get_stats(&self) -> CacheStats {
        let snapshot = self.metrics.snapshot();
        let connected = self.store.ping().await.is_ok();
        let key_count = self.store.len().await;
        CacheStats {
            hits: snapshot.cache_hits,
            misses: snapshot.cache_misses,
            hit_rate: snapshot.cache_hit_rate,
            key_count,
            memory_mb: snapshot.memory.resident_mb,
            uptime_seconds: snapshot.uptime_seconds,
            connected,
        }
    }
}

#[async_trait]
impl HealthCheck for CacheFacade {
    fn component_name(&self) -> &str {
        "cache"
    }

    async fn check(&self) -> HealthCheckResult {
        match timed_ping(&self.store).await {
            Ok(latency) => HealthCheckResult::online("cache", latency),
            Err(err) => HealthCheckResult::offline("cache", &err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MokaStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn facade() -> CacheFacade {
        CacheFacade::new(
            Arc::new(MokaStore::new(1_000)),
            "test:",
            Duration::from_secs(60),
            MetricsCollector::new(),
        )
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = facade();
        cache.set("k1", &42i32, Duration::from_secs(60)).await.unwrap();
        let value: i32 = cache.get("k1").await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn get_on_absent_key_is_miss() {
        let cache = facade();
        let err = cache.get::<i32>("missing").await.unwrap_err();
        assert!(matches!(err, CoreError::Miss));
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let cache = facade();
        cache.set("k1", &1i32, Duration::from_secs(60)).await.unwrap();
        cache.delete("k1").await.unwrap();
        assert!(matches!(cache.get::<i32>("k1").await, Err(CoreError::Miss)));
    }

    #[tokio::test]
    async fn invalidate_pattern_deletes_matching_keys_only() {
        let cache = facade();
        cache
            .set(&crate::keys::customer_analytics("c1", 10), &1i32, Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set(&crate::keys::customer_analytics("c2", 10), &2i32, Duration::from_secs(60))
            .await
            .unwrap();

        let deleted = cache
            .invalidate_pattern(&crate::keys::customer_glob("c1"))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(matches!(
            cache
                .get::<i32>(&crate::keys::customer_analytics("c1", 10))
                .await,
            Err(CoreError::Miss)
        ));
        let still_there: i32 = cache
            .get(&crate::keys::customer_analytics("c2", 10))
            .await
            .unwrap();
        assert_eq!(still_there, 2);
    }

    #[tokio::test]
    async fn get_or_set_caches_fetch_result() {
        let cache = facade();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let (value, outcome): (i32, CacheOutcome) = cache
            .get_or_set("computed", Duration::from_secs(60), || async move {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(outcome, CacheOutcome::Filled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (cached, outcome): (i32, CacheOutcome) = cache
            .get_or_set("computed", Duration::from_secs(60), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(99)
            })
            .await
            .unwrap();
        assert_eq!(cached, 7, "second call should read the cached value");
        assert_eq!(outcome, CacheOutcome::Hit);
    }

    #[tokio::test]
    async fn get_or_set_single_flights_concurrent_misses() {
        let cache = facade();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_set("shared", Duration::from_secs(60), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<i32, CoreError>(5)
                    })
                    .await
                    .unwrap()
                    .0
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 5);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn get_stats_reports_connected_store() {
        let cache = facade();
        let stats = cache.get_stats().await;
        assert!(stats.connected);
    }
}
