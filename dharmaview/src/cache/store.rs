//! Size-bounded entry store with insertion-order eviction.
//!
//! `CacheStore` holds no locks and performs no I/O. Time is passed in by the
//! caller so every rule here is deterministic under test. [`ModelCache`]
//! wraps it in a mutex and adds counters and fetching.
//!
//! Eviction is strictly by insertion order (oldest `stored_at` first), not by
//! last access. A `BTreeMap` keyed by insertion sequence gives the order
//! without sorting on every insert.
//!
//! [`ModelCache`]: super::ModelCache

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use super::config::{ModelCacheConfig, OversizePolicy};
use super::types::CacheEntry;

/// What a single `insert` did to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct InsertOutcome {
    /// Entries dropped by the expiry pass that runs first.
    pub expired: usize,
    /// Entries evicted to make room, oldest first.
    pub evicted: Vec<String>,
    /// Whether an existing entry for the same key was replaced.
    pub replaced: bool,
    /// Whether the payload was stored. False only under `OversizePolicy::Reject`.
    pub stored: bool,
    /// Payload exceeded the whole budget.
    pub oversized: bool,
}

#[derive(Debug)]
pub(crate) struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    order: BTreeMap<u64, String>,
    total_size: u64,
    next_sequence: u64,
    max_size: u64,
    max_age: Duration,
    oversize_policy: OversizePolicy,
}

impl CacheStore {
    pub fn new(config: &ModelCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            total_size: 0,
            next_sequence: 0,
            max_size: config.max_size_bytes,
            max_age: config.max_age,
            oversize_policy: config.oversize_policy,
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at()) >= self.max_age
    }

    /// Look up a live entry. Expired entries are invisible but stay in place
    /// until the next cleanup pass.
    pub fn get(&self, key: &str, now: Instant) -> Option<&CacheEntry> {
        self.entries
            .get(key)
            .filter(|entry| !self.is_expired(entry, now))
    }

    pub fn contains(&self, key: &str, now: Instant) -> bool {
        self.get(key, now).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.sequence());
        self.total_size -= entry.size_bytes();
        Some(entry)
    }

    /// Drop every entry whose age has reached the maximum.
    pub fn remove_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .values()
            .filter(|entry| self.is_expired(entry, now))
            .map(|entry| entry.key().to_string())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        if let Some(entry) = self.entries.remove(&key) {
            self.total_size -= entry.size_bytes();
        }
        Some(key)
    }

    /// Insert or replace `key`, expiring and evicting as needed.
    pub fn insert(&mut self, key: &str, payload: Bytes, now: Instant) -> InsertOutcome {
        let mut outcome = InsertOutcome {
            expired: self.remove_expired(now),
            ..Default::default()
        };

        // The replaced payload no longer counts against the budget.
        outcome.replaced = self.remove(key).is_some();

        let size = payload.len() as u64;
        outcome.oversized = size > self.max_size;
        if outcome.oversized && self.oversize_policy == OversizePolicy::Reject {
            return outcome;
        }

        while self.total_size + size > self.max_size {
            match self.evict_oldest() {
                Some(evicted) => outcome.evicted.push(evicted),
                None => break,
            }
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.order.insert(sequence, key.to_string());
        self.entries.insert(
            key.to_string(),
            CacheEntry::new(key.to_string(), payload, now, sequence),
        );
        self.total_size += size;
        outcome.stored = true;
        outcome
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total_size = 0;
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }
}
