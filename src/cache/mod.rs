//! Cache Module
//!
//! Expiring in-memory storage: entries with TTL, lazy expiry, LRU-bounded
//! capacity, and the backend seam the orchestrator talks to.

mod backend;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use backend::{CacheBackend, MemoryBackend};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::LruTracker;
pub use stats::StoreMetrics;
pub use store::ExpiringStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 512;
