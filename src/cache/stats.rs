//! Cache Statistics Module
//!
//! Tracks hit count and current usage. Snapshots are lock-free reads and
//! may lag the blob store by the duration of in-flight writes or evictions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Bytes recorded in the eviction ledger
    pub total_bytes: u64,
    /// Entries recorded in the eviction ledger
    pub entry_count: u64,
    /// Requests served from the blob store since startup
    pub hit_count: u64,
}

// == Stats Reporter ==
/// Process-lifetime counters shared by every request.
#[derive(Debug, Default)]
pub struct StatsReporter {
    total_bytes: AtomicU64,
    entry_count: AtomicU64,
    hit_count: AtomicU64,
}

impl StatsReporter {
    // == Constructor ==
    /// Creates a reporter with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter. Only the cache-hit path calls this.
    pub fn record_hit(&self) {
        self.hit_count.fetch_add(1, Ordering::Relaxed);
    }

    // == Update Usage ==
    /// Publishes the ledger's usage after an insertion or eviction.
    pub fn set_usage(&self, total_bytes: u64, entry_count: usize) {
        self.total_bytes.store(total_bytes, Ordering::Relaxed);
        self.entry_count.store(entry_count as u64, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Returns current counter values without taking any lock.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            entry_count: self.entry_count.load(Ordering::Relaxed),
            hit_count: self.hit_count.load(Ordering::Relaxed),
        }
    }
}
