//! Eviction Ledger Module
//!
//! Tracks stored entries in insertion order and enforces a byte budget.
//! Eviction is FIFO by insertion: cache hits never promote an entry.

use std::collections::VecDeque;

use crate::cache::entry::{current_timestamp_ms, CacheEntry};
use crate::error::{CacheError, Result};

// == Budget ==
/// Byte budget for the cache.
///
/// Eviction starts once usage exceeds `capacity_bytes` and drains down to
/// `capacity_bytes * eviction_target_ratio`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Budget {
    capacity_bytes: u64,
    eviction_target_ratio: f64,
}

impl Budget {
    /// Creates a budget; the ratio must lie in (0, 1].
    pub fn new(capacity_bytes: u64, eviction_target_ratio: f64) -> Result<Self> {
        if !eviction_target_ratio.is_finite()
            || eviction_target_ratio <= 0.0
            || eviction_target_ratio > 1.0
        {
            return Err(CacheError::InvalidConfig(format!(
                "eviction target ratio must be in (0, 1], got {}",
                eviction_target_ratio
            )));
        }

        Ok(Self {
            capacity_bytes,
            eviction_target_ratio,
        })
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    pub fn eviction_target_ratio(&self) -> f64 {
        self.eviction_target_ratio
    }

    /// Usage level eviction drains down to.
    pub fn target_bytes(&self) -> f64 {
        self.capacity_bytes as f64 * self.eviction_target_ratio
    }

    fn is_exceeded(&self, usage: u64) -> bool {
        usage > self.capacity_bytes
    }

    fn is_drained(&self, usage: u64) -> bool {
        usage as f64 <= self.target_bytes()
    }
}

// == Eviction Ledger ==
/// Ordered record of cached entries.
///
/// Entries are stored in a VecDeque where:
/// - Front = Oldest insertion (next eviction victim)
/// - Back = Most recent insertion
#[derive(Debug)]
pub struct EvictionLedger {
    entries: VecDeque<CacheEntry>,
    usage: u64,
    budget: Budget,
    last_inserted_at: u64,
}

impl EvictionLedger {
    // == Constructor ==
    /// Creates an empty ledger enforcing `budget`.
    pub fn new(budget: Budget) -> Self {
        Self {
            entries: VecDeque::new(),
            usage: 0,
            budget,
            last_inserted_at: 0,
        }
    }

    // == Record Insertion ==
    /// Appends an entry at the tail and adds its size to usage.
    ///
    /// A key already present is a rewrite of the same stored object: its old
    /// record is dropped first so usage is never counted twice.
    pub fn record_insertion(&mut self, key: &str, size_bytes: u64) -> &CacheEntry {
        if let Some(position) = self.entries.iter().position(|entry| entry.key == key) {
            if let Some(previous) = self.entries.remove(position) {
                self.usage = self.usage.saturating_sub(previous.size_bytes);
            }
        }

        let inserted_at = current_timestamp_ms().max(self.last_inserted_at + 1);
        self.last_inserted_at = inserted_at;

        self.usage += size_bytes;
        self.entries
            .push_back(CacheEntry::new(key, size_bytes, inserted_at));
        &self.entries[self.entries.len() - 1]
    }

    // == Maybe Evict ==
    /// Pops the oldest entries while the budget is exceeded.
    ///
    /// Returns the victims, oldest first. Usage and entry count are already
    /// adjusted; deleting the victims from the blob store is the caller's job.
    pub fn maybe_evict(&mut self) -> Vec<CacheEntry> {
        let mut evicted = Vec::new();
        if !self.budget.is_exceeded(self.usage) {
            return evicted;
        }

        while !self.budget.is_drained(self.usage) {
            let Some(victim) = self.entries.pop_front() else {
                break;
            };
            self.usage = self.usage.saturating_sub(victim.size_bytes);
            evicted.push(victim);
        }

        evicted
    }

    // == Accessors ==
    /// Total bytes of all recorded entries.
    pub fn usage(&self) -> u64 {
        self.usage
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `key` currently has a record.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    /// Returns the next eviction victim without removing it.
    pub fn peek_oldest(&self) -> Option<&CacheEntry> {
        self.entries.front()
    }

    /// Keys in eviction order, oldest first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }
}
