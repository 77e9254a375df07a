//! Cache Store Module
//!
//! Concurrent path-keyed storage with exactly-once insertion and an atomic
//! running total of cached bytes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::cache::CacheEntry;

// == Cache Store ==
/// Sharded concurrent map from path to entry.
///
/// The byte counter is adjusted by whichever caller actually installs or
/// detaches an entry, so it only lags the map for the duration of a single
/// insert or remove.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Path to entry storage
    entries: DashMap<String, Arc<CacheEntry>>,
    /// Sum of `content_length` over all held entries
    total_bytes: AtomicU64,
}

impl CacheStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Lookup ==
    /// Returns the entry for `key`, if any. The shard guard is released
    /// before returning.
    pub fn lookup(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    // == Insert If Absent ==
    /// Installs the entry built by `factory` unless `key` is already present.
    ///
    /// `factory` runs at most once and only while the key's shard is held, so
    /// among concurrent callers exactly one wins. Returns the entry now held
    /// for `key` and whether this call installed it.
    pub fn insert_if_absent<F>(&self, key: &str, factory: F) -> (Arc<CacheEntry>, bool)
    where
        F: FnOnce() -> CacheEntry,
    {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) => (Arc::clone(occupied.get()), false),
            Entry::Vacant(vacant) => {
                let entry = Arc::new(factory());
                self.total_bytes
                    .fetch_add(entry.content_length(), Ordering::AcqRel);
                vacant.insert(Arc::clone(&entry));
                (entry, true)
            }
        }
    }

    // == Remove ==
    /// Detaches whatever entry is held for `key` and releases its bytes from
    /// the running total.
    pub fn remove(&self, key: &str) -> Option<Arc<CacheEntry>> {
        let (_, removed) = self.entries.remove(key)?;
        self.release(&removed);
        Some(removed)
    }

    /// Detaches `entry` only if it is still the one held for its key. A
    /// caller working from a stale reference therefore never removes a newer
    /// entry for the same path.
    pub fn remove_entry(&self, entry: &Arc<CacheEntry>) -> bool {
        match self
            .entries
            .remove_if(entry.key(), |_, held| Arc::ptr_eq(held, entry))
        {
            Some((_, removed)) => {
                self.release(&removed);
                true
            }
            None => false,
        }
    }

    fn release(&self, removed: &CacheEntry) {
        // Readers still holding the payload keep it alive; only the
        // accounting happens here.
        self.total_bytes
            .fetch_sub(removed.content_length(), Ordering::AcqRel);
    }

    // == Snapshot ==
    /// Point-in-time copy of every held entry.
    pub fn snapshot_values(&self) -> Vec<Arc<CacheEntry>> {
        self.entries
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Point-in-time copy of every held key.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    // == Sizes ==
    /// Number of held entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bytes counted against the size bound.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Acquire)
    }
}
