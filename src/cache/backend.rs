//! Cache Backend Module
//!
//! The seam between the orchestrator and whatever actually holds entries.
//! `MemoryBackend` is the in-process implementation built on `ExpiringStore`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::{ExpiringStore, StoreMetrics};
use crate::error::CacheResult;

// == Backend Trait ==
/// Storage operations the orchestrator relies on.
///
/// Every method may fail; the orchestrator treats any failure as a miss or a
/// no-op, so implementations should report problems rather than panic.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fresh value for `key`, or None.
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Stores `value`, with no expiry when `ttl_seconds` is None.
    async fn set(&self, key: &str, value: Value, ttl_seconds: Option<u64>) -> CacheResult<()>;

    /// Removes `key` if present.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Removes everything.
    async fn clear(&self) -> CacheResult<()>;

    /// Whether a fresh value exists for `key`.
    async fn has(&self, key: &str) -> CacheResult<bool>;

    /// Every key that is fresh at call time.
    async fn keys(&self) -> CacheResult<Vec<String>>;

    /// Hit/miss/eviction counters.
    async fn metrics(&self) -> CacheResult<StoreMetrics>;
}

// == Memory Backend ==
/// Thread-safe in-memory backend.
///
/// Cloning is cheap and shares the same store, which lets the sweep task hold
/// a handle while the orchestrator owns the original.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    store: Arc<RwLock<ExpiringStore<Value>>>,
}

impl MemoryBackend {
    /// Creates a backend bounded to `max_entries`.
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(ExpiringStore::new(max_entries))),
        }
    }

    /// Reclaims stale entries; used by the background sweep.
    pub async fn purge_expired(&self) -> usize {
        self.store.write().await.purge_expired()
    }

    /// Number of physically held entries, stale ones included.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(crate::config::Config::default().max_entries)
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        // write lock: a read may reclaim a stale entry and touches recency
        Ok(self.store.write().await.get(key))
    }

    async fn set(&self, key: &str, value: Value, ttl_seconds: Option<u64>) -> CacheResult<()> {
        self.store.write().await.set(key, value, ttl_seconds)
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.store.write().await.delete(key);
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.store.write().await.clear();
        Ok(())
    }

    async fn has(&self, key: &str) -> CacheResult<bool> {
        Ok(self.store.write().await.has(key))
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(self.store.write().await.keys())
    }

    async fn metrics(&self) -> CacheResult<StoreMetrics> {
        Ok(self.store.read().await.metrics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_backend_round_trip() {
        let backend = MemoryBackend::new(10);
        backend
            .set("channel:single:1", json!({"name": "Team"}), Some(60))
            .await
            .unwrap();

        let value = backend.get("channel:single:1").await.unwrap();
        assert_eq!(value, Some(json!({"name": "Team"})));
        assert!(backend.has("channel:single:1").await.unwrap());
        assert_eq!(backend.keys().await.unwrap(), vec!["channel:single:1"]);
    }

    #[tokio::test]
    async fn test_clones_share_store() {
        let backend = MemoryBackend::new(10);
        let handle = backend.clone();

        backend.set("k", json!(1), None).await.unwrap();
        assert_eq!(handle.get("k").await.unwrap(), Some(json!(1)));

        handle.delete("k").await.unwrap();
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_and_clear_never_fail() {
        let backend = MemoryBackend::new(10);
        backend.delete("absent").await.unwrap();
        backend.set("a", json!("x"), None).await.unwrap();
        backend.clear().await.unwrap();

        assert_eq!(backend.len().await, 0);
    }

    #[tokio::test]
    async fn test_metrics_exposed() {
        let backend = MemoryBackend::new(10);
        backend.set("a", json!(1), None).await.unwrap();
        backend.get("a").await.unwrap();
        backend.get("b").await.unwrap();

        let metrics = backend.metrics().await.unwrap();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
    }
}
