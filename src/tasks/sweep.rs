//! Expiry Sweep Task
//!
//! Reads already treat stale entries as absent; the sweep only frees the
//! memory held by entries nobody asks for again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::MemoryBackend;

/// Spawns a task that purges expired entries from `backend` every `interval`.
///
/// `backend` is a clone sharing the orchestrator's store. Abort the returned
/// handle on shutdown.
///
/// # Example
/// ```ignore
/// let backend = MemoryBackend::new(1000);
/// let orchestrator = CacheOrchestrator::new(backend.clone());
/// let sweep = spawn_sweep_task(backend, Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_sweep_task(backend: MemoryBackend, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting expiry sweep every {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = backend.purge_expired().await;
            if removed > 0 {
                info!("Expiry sweep: removed {} stale entries", removed);
            } else {
                debug!("Expiry sweep: nothing to remove");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBackend;
    use serde_json::json;

    #[tokio::test]
    async fn test_sweep_removes_expired_entries() {
        let backend = MemoryBackend::new(100);
        backend.set("expire_soon", json!("value"), Some(1)).await.unwrap();

        let handle = spawn_sweep_task(backend.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(backend.len().await, 0, "stale entry should be reclaimed");
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_preserves_fresh_entries() {
        let backend = MemoryBackend::new(100);
        backend.set("long_lived", json!("value"), Some(3600)).await.unwrap();
        backend.set("forever", json!(1), None).await.unwrap();

        let handle = spawn_sweep_task(backend.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(backend.get("long_lived").await.unwrap(), Some(json!("value")));
        assert_eq!(backend.len().await, 2);
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_can_be_aborted() {
        let handle = spawn_sweep_task(MemoryBackend::new(10), Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "task should be finished after abort");
    }
}
