//! Cache Orchestrator Module
//!
//! Wraps one cache backend with key construction, TTL classification,
//! never-failing get/set/invalidate helpers, pattern invalidation, and
//! statistics. Cache failures are logged and degrade to a miss or a no-op;
//! they never reach the caller.

mod invalidation;
mod keys;
mod ttl;

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::cache::CacheBackend;
use crate::error::{CacheResult, ServiceResult};
use crate::models::{CacheStatsSnapshot, ReadResponse};

pub use invalidation::{render_template, InvalidationMap};
pub use keys::{sanitize_segment, CacheKey, KeyPattern, KEY_DELIMITER, WILDCARD};
pub use ttl::{calculate_ttl, DataCategory, DEFAULT_TTL_SECONDS};

// == Cache Orchestrator ==
/// Owns one backend exclusively; each use-case service owns one orchestrator.
pub struct CacheOrchestrator {
    backend: Box<dyn CacheBackend>,
}

impl std::fmt::Debug for CacheOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOrchestrator").finish_non_exhaustive()
    }
}

impl CacheOrchestrator {
    // == Constructors ==
    pub fn new(backend: impl CacheBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    // == Keys and TTLs ==
    /// Joins `prefix` and the sanitized `parts` with `:`.
    pub fn generate_cache_key<I>(prefix: &str, parts: I) -> String
    where
        I: IntoIterator,
        I::Item: std::fmt::Display,
    {
        CacheKey::new(prefix).with_all(parts).to_string()
    }

    /// TTL in seconds for a category name; unknown names get 300.
    pub fn calculate_ttl(category: &str) -> u64 {
        calculate_ttl(category)
    }

    // == Get Cached ==
    /// Cached value for `key`, or None on miss or on any cache failure.
    pub async fn get_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key).await {
            Ok(Some(value)) => {
                debug!("Cache hit for key: {}", key);
                Some(value)
            }
            Ok(None) => {
                debug!("Cache miss for key: {}", key);
                None
            }
            Err(e) => {
                error!("Failed to get cached data for key {}: {}", key, e);
                None
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.backend.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }

    // == Set Cached ==
    /// Stores `value` under `key` for `ttl_seconds`. Failures are logged only.
    pub async fn set_cached<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: u64) {
        let result = match serde_json::to_value(value) {
            Ok(raw) => self.backend.set(key, raw, Some(ttl_seconds)).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => debug!("Cached data for key: {} with TTL: {}s", key, ttl_seconds),
            Err(e) => error!("Failed to cache data for key {}: {}", key, e),
        }
    }

    // == Invalidate ==
    /// Removes one key. Failures are logged only.
    pub async fn invalidate_cache(&self, key: &str) {
        match self.backend.delete(key).await {
            Ok(()) => debug!("Invalidated cache for key: {}", key),
            Err(e) => error!("Failed to invalidate cache for key {}: {}", key, e),
        }
    }

    /// Removes every key matching `pattern` by segment prefix. Returns the
    /// number of keys removed (0 when enumeration fails).
    pub async fn invalidate_cache_pattern(&self, pattern: &KeyPattern) -> usize {
        self.invalidate_where(&pattern.to_string(), |key| pattern.matches(key))
            .await
    }

    /// Removes every key containing `substring` literally. Broader than
    /// `invalidate_cache_pattern`: `"12"` also hits `"120"`.
    pub async fn invalidate_containing(&self, substring: &str) -> usize {
        self.invalidate_where(substring, |key| key.contains(substring))
            .await
    }

    /// Applies a batch of patterns, typically from an invalidation map.
    pub async fn invalidate_patterns(&self, patterns: &[KeyPattern]) -> usize {
        let mut removed = 0;
        for pattern in patterns {
            removed += self.invalidate_cache_pattern(pattern).await;
        }
        removed
    }

    async fn invalidate_where<F>(&self, label: &str, predicate: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let keys = match self.backend.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                error!("Failed to invalidate cache pattern {}: {}", label, e);
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys.iter().filter(|key| predicate(key.as_str())) {
            match self.backend.delete(key).await {
                Ok(()) => removed += 1,
                Err(e) => error!("Failed to invalidate cache for key {}: {}", key, e),
            }
        }
        debug!("Invalidated cache pattern: {} ({} keys)", label, removed);
        removed
    }

    // == Stats ==
    /// Fresh snapshot of keys and counters. Empty when the backend fails.
    pub async fn get_cache_stats(&self) -> CacheStatsSnapshot {
        let keys = self.backend.keys().await;
        let metrics = self.backend.metrics().await;
        match (keys, metrics) {
            (Ok(keys), Ok(metrics)) => CacheStatsSnapshot::new(keys, metrics),
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to collect cache stats: {}", e);
                CacheStatsSnapshot::empty()
            }
        }
    }

    /// Drops every entry. Failures are logged only.
    pub async fn clear_cache(&self) {
        match self.backend.clear().await {
            Ok(()) => debug!("Cache cleared"),
            Err(e) => error!("Failed to clear cache: {}", e),
        }
    }

    // == Read Through ==
    /// The shared cache-aside read path.
    ///
    /// Returns the cached envelope marked `cached` on a hit. On a miss calls
    /// `fetch`; a successful payload is wrapped, stored under the category's
    /// TTL, and returned. A failed fetch is returned as a failure envelope and
    /// nothing is cached.
    pub async fn read_through<T, F, Fut>(
        &self,
        key: &CacheKey,
        category: DataCategory,
        fetch: F,
    ) -> ReadResponse<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        let rendered = key.to_string();
        if let Some(hit) = self.get_cached::<ReadResponse<T>>(&rendered).await {
            return hit.into_cached();
        }

        match fetch().await {
            Ok(payload) => {
                let response = ReadResponse::fresh(payload);
                self.set_cached(&rendered, &response, category.ttl_seconds())
                    .await;
                response
            }
            Err(e) => {
                warn!("Fetch for {} failed: {}", rendered, e);
                ReadResponse::failed(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryBackend, StoreMetrics};
    use crate::error::{CacheError, ServiceError};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::sleep;
    use std::time::Duration;

    fn orchestrator() -> CacheOrchestrator {
        CacheOrchestrator::new(MemoryBackend::new(100))
    }

    /// Backend whose every operation fails.
    struct BrokenBackend;

    #[async_trait]
    impl CacheBackend for BrokenBackend {
        async fn get(&self, _: &str) -> CacheResult<Option<Value>> {
            Err(CacheError::Backend("get exploded".to_string()))
        }
        async fn set(&self, _: &str, _: Value, _: Option<u64>) -> CacheResult<()> {
            Err(CacheError::Backend("set exploded".to_string()))
        }
        async fn delete(&self, _: &str) -> CacheResult<()> {
            Err(CacheError::Backend("delete exploded".to_string()))
        }
        async fn clear(&self) -> CacheResult<()> {
            Err(CacheError::Backend("clear exploded".to_string()))
        }
        async fn has(&self, _: &str) -> CacheResult<bool> {
            Err(CacheError::Backend("has exploded".to_string()))
        }
        async fn keys(&self) -> CacheResult<Vec<String>> {
            Err(CacheError::Backend("keys exploded".to_string()))
        }
        async fn metrics(&self) -> CacheResult<StoreMetrics> {
            Err(CacheError::Backend("metrics exploded".to_string()))
        }
    }

    #[test]
    fn test_generate_cache_key() {
        assert_eq!(
            CacheOrchestrator::generate_cache_key("user", ["123", "profile"]),
            "user:123:profile"
        );
        assert_eq!(
            CacheOrchestrator::generate_cache_key("channel", ["123".to_string(), 456.to_string()]),
            "channel:123:456"
        );
        assert_eq!(CacheOrchestrator::generate_cache_key("user", Vec::<u32>::new()), "user");
        assert_eq!(
            CacheOrchestrator::generate_cache_key("user", ["a b"]),
            CacheOrchestrator::generate_cache_key("user", ["a b"])
        );
    }

    #[test]
    fn test_calculate_ttl() {
        assert_eq!(CacheOrchestrator::calculate_ttl("user_profile"), 1800);
        assert_eq!(CacheOrchestrator::calculate_ttl("channel_list"), 900);
        assert_eq!(CacheOrchestrator::calculate_ttl("analytics_report"), 3600);
        assert_eq!(CacheOrchestrator::calculate_ttl("totally_unknown"), 300);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = orchestrator();
        cache.set_cached("user:1:profile", &json!({"name": "a"}), 60).await;

        let value: Option<Value> = cache.get_cached("user:1:profile").await;
        assert_eq!(value, Some(json!({"name": "a"})));
    }

    #[tokio::test]
    async fn test_type_mismatch_degrades_to_miss() {
        let cache = orchestrator();
        cache.set_cached("k", &"not a number", 60).await;

        let value: Option<u64> = cache.get_cached("k").await;
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_pattern_invalidation_precision() {
        let cache = orchestrator();
        for key in ["user:1:profile", "user:2:profile", "channel:1:info"] {
            cache.set_cached(key, &1, 60).await;
        }

        let removed = cache.invalidate_cache_pattern(&KeyPattern::parse("user:1")).await;

        assert_eq!(removed, 1);
        let stats = cache.get_cache_stats().await;
        assert_eq!(stats.keys, vec!["channel:1:info", "user:2:profile"]);
    }

    #[tokio::test]
    async fn test_pattern_does_not_match_longer_ids() {
        let cache = orchestrator();
        cache.set_cached("user:12:profile", &1, 60).await;
        cache.set_cached("user:120:profile", &1, 60).await;

        cache.invalidate_cache_pattern(&KeyPattern::parse("user:12")).await;

        assert_eq!(cache.get_cache_stats().await.keys, vec!["user:120:profile"]);
    }

    #[tokio::test]
    async fn test_substring_invalidation_is_literal() {
        let cache = orchestrator();
        for key in ["channel:123", "channel:123:members", "channel:stats:123", "user:9"] {
            cache.set_cached(key, &1, 60).await;
        }

        let removed = cache.invalidate_containing("123").await;

        assert_eq!(removed, 3);
        assert_eq!(cache.get_cache_stats().await.keys, vec!["user:9"]);
        // '*' is not a glob here
        assert_eq!(cache.invalidate_containing("user:*").await, 0);
    }

    #[tokio::test]
    async fn test_invalidate_single_key_and_clear() {
        let cache = orchestrator();
        cache.set_cached("a", &1, 60).await;
        cache.set_cached("b", &2, 60).await;

        cache.invalidate_cache("a").await;
        cache.invalidate_cache("a").await;
        assert_eq!(cache.get_cache_stats().await.total_keys, 1);

        cache.clear_cache().await;
        assert_eq!(cache.get_cache_stats().await.total_keys, 0);
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let cache = orchestrator();
        cache.set_cached("a", &1, 60).await;
        let _: Option<u32> = cache.get_cached("a").await;
        let _: Option<u32> = cache.get_cached("missing").await;

        let stats = cache.get_cache_stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 0.5);
    }

    #[tokio::test]
    async fn test_broken_backend_never_surfaces() {
        let cache = CacheOrchestrator::new(BrokenBackend);

        let value: Option<u32> = cache.get_cached("k").await;
        assert_eq!(value, None);
        cache.set_cached("k", &1, 60).await;
        cache.invalidate_cache("k").await;
        assert_eq!(cache.invalidate_cache_pattern(&KeyPattern::parse("k")).await, 0);
        assert_eq!(cache.invalidate_containing("k").await, 0);
        cache.clear_cache().await;
        assert_eq!(cache.get_cache_stats().await, CacheStatsSnapshot::empty());
    }

    #[tokio::test]
    async fn test_read_through_hit_and_miss() {
        let cache = orchestrator();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let key = CacheKey::new("channel").with("single").with("c1");

        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ServiceError>("Team".to_string())
        };

        let first = cache.read_through(&key, DataCategory::ChannelInfo, fetch).await;
        let second = cache.read_through(&key, DataCategory::ChannelInfo, fetch).await;

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.payload.as_deref(), Some("Team"));
        assert_eq!(second.fetched_at, first.fetched_at);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_through_refetches_after_expiry() {
        let cache = orchestrator();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let key = CacheKey::new("analytics").with("realtime");
        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ServiceError>(7u32)
        };

        cache.read_through(&key, DataCategory::Temporary, fetch).await;
        // rewrite the entry with a 1s TTL to avoid waiting a full minute
        let envelope: ReadResponse<u32> = cache.get_cached(&key.to_string()).await.unwrap();
        cache.set_cached(&key.to_string(), &envelope, 1).await;
        cache.read_through(&key, DataCategory::Temporary, fetch).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sleep(Duration::from_millis(1100));
        let third = cache.read_through(&key, DataCategory::Temporary, fetch).await;

        assert!(!third.cached);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_read_through_failure_not_cached() {
        let cache = orchestrator();
        let key = CacheKey::new("user").with("current").with("ghost");

        let resp: ReadResponse<String> = cache
            .read_through(&key, DataCategory::UserProfile, || async {
                Err(ServiceError::NotFound("user ghost".to_string()))
            })
            .await;

        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("Not found: user ghost"));
        assert_eq!(cache.get_cache_stats().await.total_keys, 0);
    }

    #[tokio::test]
    async fn test_read_through_falls_back_when_cache_broken() {
        let cache = CacheOrchestrator::new(BrokenBackend);
        let key = CacheKey::new("user").with("current").with("1");

        let resp = cache
            .read_through(&key, DataCategory::UserProfile, || async {
                Ok::<_, ServiceError>(5u8)
            })
            .await;

        assert!(resp.success);
        assert_eq!(resp.payload, Some(5));
    }
}
