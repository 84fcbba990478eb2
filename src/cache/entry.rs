//! Cache Entry Module
//!
//! A stored value together with the instant it was written and its TTL.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single value held by the expiring store.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion timestamp (Unix milliseconds)
    pub inserted_at_ms: u64,
    /// Lifetime in seconds, None = lives until deleted or cleared
    pub ttl_seconds: Option<u64>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(value: V, ttl_seconds: Option<u64>) -> Self {
        Self {
            value,
            inserted_at_ms: current_timestamp_ms(),
            ttl_seconds,
        }
    }

    /// Last instant (Unix milliseconds) at which the entry is still fresh.
    pub fn expires_at_ms(&self) -> Option<u64> {
        self.ttl_seconds
            .map(|ttl| self.inserted_at_ms.saturating_add(ttl.saturating_mul(1000)))
    }

    // == Is Expired ==
    /// Checks whether the entry is stale at `now_ms`.
    ///
    /// An entry stays fresh up to and including `inserted_at + ttl`; it is
    /// expired only once the clock has moved strictly past that instant.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at_ms() {
            Some(deadline) => now_ms > deadline,
            None => false,
        }
    }

    /// Checks whether the entry is stale right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Remaining lifetime in milliseconds, None if the entry never expires.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        let now = current_timestamp_ms();
        self.expires_at_ms()
            .map(|deadline| deadline.saturating_sub(now))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
