//! LRU Eviction Module
//!
//! Picks victims in least-recently-used order until the cache fits its count
//! and size bounds again.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheBounds, CacheEntry, CacheStore};

// == Eviction Order ==
/// Sorts entries into eviction order: oldest access first, then smaller
/// payload first, then by key.
///
/// Access times are read once up front so concurrent touches cannot make the
/// comparison inconsistent mid-sort.
pub fn eviction_order(entries: Vec<Arc<CacheEntry>>) -> Vec<Arc<CacheEntry>> {
    let mut keyed: Vec<(u64, u64, Arc<CacheEntry>)> = entries
        .into_iter()
        .map(|entry| (entry.last_accessed(), entry.content_length(), entry))
        .collect();

    keyed.sort_by(|a, b| compare_candidates((a.0, a.1, a.2.key()), (b.0, b.1, b.2.key())));
    keyed.into_iter().map(|(_, _, entry)| entry).collect()
}

fn compare_candidates(a: (u64, u64, &str), b: (u64, u64, &str)) -> Ordering {
    a.0.cmp(&b.0)
        .then_with(|| a.1.cmp(&b.1))
        .then_with(|| a.2.cmp(b.2))
}

// == Shrink ==
/// Evicts entries until both bounds hold or the store is empty.
///
/// Runs on the caller's thread. Returns the number of entries this call
/// removed; entries concurrently removed by someone else are not counted.
pub fn shrink(store: &CacheStore, bounds: &CacheBounds) -> usize {
    let mut evicted = 0;

    while !store.is_empty() && !bounds.satisfied_by(store.len(), store.total_bytes()) {
        evicted += evict_in_order(store, bounds, eviction_order(store.snapshot_values()));
    }

    evicted
}

/// Removes `candidates` in order until the bounds hold. Stops at the first
/// candidate that is already gone, since the rest of the snapshot is then
/// out of date.
fn evict_in_order(
    store: &CacheStore,
    bounds: &CacheBounds,
    candidates: Vec<Arc<CacheEntry>>,
) -> usize {
    let mut evicted = 0;
    for entry in candidates {
        if bounds.satisfied_by(store.len(), store.total_bytes()) || !store.remove_entry(&entry) {
            break;
        }
        evicted += 1;
        debug!(
            key = entry.key(),
            length = entry.content_length(),
            "evicted cache entry"
        );
    }
    evicted
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Content;

    fn insert(store: &CacheStore, key: &str, len: usize, accessed: u64) -> Arc<CacheEntry> {
        let (entry, _) = store.insert_if_absent(key, || {
            CacheEntry::found(key, Arc::new(Content::new(vec![1u8; len])), -1)
        });
        entry.set_last_accessed(accessed);
        entry
    }

    fn keys(entries: &[Arc<CacheEntry>]) -> Vec<&str> {
        entries.iter().map(|e| e.key()).collect()
    }

    #[test]
    fn test_order_by_last_accessed() {
        let store = CacheStore::new();
        insert(&store, "/c", 1, 30);
        insert(&store, "/a", 1, 10);
        insert(&store, "/b", 1, 20);

        let ordered = eviction_order(store.snapshot_values());
        assert_eq!(keys(&ordered), vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_ties_broken_by_length_then_key() {
        let store = CacheStore::new();
        insert(&store, "/big", 100, 5);
        insert(&store, "/small-b", 10, 5);
        insert(&store, "/small-a", 10, 5);

        let ordered = eviction_order(store.snapshot_values());
        assert_eq!(keys(&ordered), vec!["/small-a", "/small-b", "/big"]);
    }

    #[test]
    fn test_shrink_evicts_oldest_for_count() {
        let store = CacheStore::new();
        let bounds = CacheBounds::new(1000, 1000, 2, -1);
        insert(&store, "/a", 1, 10);
        insert(&store, "/b", 1, 20);
        insert(&store, "/c", 1, 30);

        let evicted = shrink(&store, &bounds);

        assert_eq!(evicted, 1);
        assert!(store.lookup("/a").is_none());
        assert!(store.lookup("/b").is_some());
        assert!(store.lookup("/c").is_some());
    }

    #[test]
    fn test_shrink_evicts_for_size() {
        let store = CacheStore::new();
        let bounds = CacheBounds::new(1000, 100, 10, -1);
        insert(&store, "/a", 60, 10);
        insert(&store, "/b", 30, 20);
        insert(&store, "/c", 50, 30);

        shrink(&store, &bounds);

        assert!(store.lookup("/a").is_none());
        assert_eq!(store.total_bytes(), 80);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_shrink_noop_within_bounds() {
        let store = CacheStore::new();
        let bounds = CacheBounds::new(1000, 1000, 10, -1);
        insert(&store, "/a", 10, 10);

        assert_eq!(shrink(&store, &bounds), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_shrink_empties_store_when_disabled() {
        let store = CacheStore::new();
        let bounds = CacheBounds::new(1000, 1000, 0, -1);
        insert(&store, "/a", 10, 10);
        insert(&store, "/b", 10, 20);

        assert_eq!(shrink(&store, &bounds), 2);
        assert!(store.is_empty());
        assert_eq!(store.total_bytes(), 0);
    }

    #[test]
    fn test_pass_stops_at_entry_removed_elsewhere() {
        let store = CacheStore::new();
        let bounds = CacheBounds::new(1000, 1000, 1, -1);
        let gone = insert(&store, "/a", 1, 10);
        let b = insert(&store, "/b", 1, 20);
        let c = insert(&store, "/c", 1, 30);
        store.remove("/a");

        assert_eq!(evict_in_order(&store, &bounds, vec![gone, b, c]), 0);
        assert_eq!(store.len(), 2);

        assert_eq!(shrink(&store, &bounds), 1);
        assert!(store.lookup("/b").is_none());
        assert!(store.lookup("/c").is_some());
    }

    #[test]
    fn test_oversized_single_entry_is_evicted() {
        let store = CacheStore::new();
        let bounds = CacheBounds::new(10, 10, 10, -1);
        insert(&store, "/huge", 50, 10);

        shrink(&store, &bounds);
        assert!(store.is_empty());
    }
}
