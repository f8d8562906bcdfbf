mod noop_store;
mod redis_store;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use rizq_core::Result;

use noop_store::NoopCacheStore;
use redis_store::RedisCacheStore;

/// TTLs per key family. Profile and activity keys churn on every completion,
/// so they stay short; the dua/journey catalogs change rarely.
pub const PROFILE_TTL: Duration = Duration::from_secs(60);
pub const ACTIVITY_TTL: Duration = Duration::from_secs(60);
pub const CATALOG_TTL: Duration = Duration::from_secs(600);

#[derive(Clone, Debug)]
enum CacheBackend {
    Disabled(NoopCacheStore),
    Redis(RedisCacheStore),
}

#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    backend: CacheBackend,
    /// Per-key guards so at most one load per key is in flight at a time.
    inflight: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl CacheService {
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Disabled(NoopCacheStore),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Redis(RedisCacheStore::from_url(redis_url)?),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, CacheBackend::Redis(_))
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(_) => Ok(()),
            CacheBackend::Redis(store) => store.ping().await,
        }
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let value = match &self.backend {
            CacheBackend::Disabled(store) => store.get(key).await,
            CacheBackend::Redis(store) => store.get(key).await,
        }?;

        match value {
            Some(bytes) => {
                let parsed = serde_json::from_slice(&bytes).map_err(|e| {
                    anyhow::anyhow!("failed to deserialize cache value for `{key}`: {e}")
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let ttl_seconds = ttl.as_secs().max(1);
        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize cache value for `{key}`: {e}"))?;

        match &self.backend {
            CacheBackend::Disabled(store) => store.set(key, payload, ttl_seconds).await,
            CacheBackend::Redis(store) => store.set(key, payload, ttl_seconds).await,
        }
    }

    /// Drop a key. Write paths call this after commit so dependent reads are
    /// never served a stale value; a failed delete degrades with a warning
    /// because the TTL still bounds staleness.
    pub async fn invalidate(&self, key: &str) {
        let result = match &self.backend {
            CacheBackend::Disabled(store) => store.del(key).await,
            CacheBackend::Redis(store) => store.del(key).await,
        };

        if let Err(e) = result {
            warn!(?e, cache_key = key, "cache invalidation failed; TTL will expire the entry");
        }
    }

    /// Cached read with single-flight de-duplication: concurrent callers for
    /// the same key wait for the first loader instead of each hitting the
    /// database. Cache failures fall back to the loader.
    pub async fn get_or_load_json<T, F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let guard = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(
                inflight
                    .entry(key.to_owned())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        let _held = guard.lock().await;

        match self.get_json::<T>(key).await {
            Ok(Some(cached)) => {
                self.release_inflight(key, &guard).await;
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(
                ?e,
                cache_key = key,
                "cache get failed; falling back to database"
            ),
        }

        let loaded = loader().await;

        if let Ok(value) = &loaded {
            if let Err(e) = self.set_json(key, value, ttl).await {
                warn!(
                    ?e,
                    cache_key = key,
                    "cache set failed; returning database value"
                );
            }
        }

        self.release_inflight(key, &guard).await;
        loaded
    }

    async fn release_inflight(&self, key: &str, guard: &Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock().await;
        // The map entry plus our clone account for two references; anything
        // more means another caller is queued on this key.
        if Arc::strong_count(guard) <= 2 {
            inflight.remove(key);
        }
    }
}

pub fn profile_key(cache: &CacheService, user_id: Uuid) -> String {
    cache.key(format!("profile:{user_id}"))
}

pub fn activity_key(cache: &CacheService, user_id: Uuid, date: NaiveDate) -> String {
    cache.key(format!("activity:{user_id}:{date}"))
}

pub fn dua_list_key(cache: &CacheService) -> String {
    cache.key("duas:all")
}

pub fn journey_list_key(cache: &CacheService) -> String {
    cache.key("journeys:all")
}

pub fn journey_key(cache: &CacheService, journey_id: i64) -> String {
    cache.key(format!("journeys:{journey_id}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::CacheService;

    #[tokio::test]
    async fn disabled_backend_always_loads() {
        let cache = CacheService::disabled("rizq:test");
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value: i64 = cache
                .get_or_load_json("k", Duration::from_secs(5), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        // No storage behind the noop backend, so every read loads.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn loader_errors_propagate() {
        let cache = CacheService::disabled("rizq:test");
        let result: rizq_core::Result<i64> = cache
            .get_or_load_json("k", Duration::from_secs(5), || async {
                Err(rizq_core::RizqError::validation("nope"))
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn concurrent_loads_for_one_key_run_one_at_a_time() {
        let cache = CacheService::disabled("rizq:test");
        let active = Arc::new(AtomicU32::new(0));
        let peak = Arc::new(AtomicU32::new(0));

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            tasks.push(tokio::spawn(async move {
                let value: i64 = cache
                    .get_or_load_json("hot", Duration::from_secs(5), move || async move {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok(9)
                    })
                    .await
                    .unwrap();
                value
            }));
        }

        for task in tasks {
            assert_eq!(task.await.unwrap(), 9);
        }

        // Loaders for the same key never overlapped, and the last caller out
        // cleaned up the guard.
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert!(cache.inflight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn inflight_map_drains_after_load() {
        let cache = CacheService::disabled("rizq:test");
        let _: i64 = cache
            .get_or_load_json("k", Duration::from_secs(5), || async { Ok(1) })
            .await
            .unwrap();
        assert!(cache.inflight.lock().await.is_empty());
    }

    #[test]
    fn keys_carry_the_prefix() {
        let cache = CacheService::disabled("rizq:test");
        assert_eq!(super::dua_list_key(&cache), "rizq:test:duas:all");
        assert_eq!(super::journey_key(&cache, 4), "rizq:test:journeys:4");
    }
}
