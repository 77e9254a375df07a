//! Content Cache Module
//!
//! The public face of the cache: answers content lookups from the store,
//! falls back to the content authority on a miss, and keeps the store within
//! its bounds.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::authority::ContentAuthority;
use crate::cache::{lru, CacheBounds, CacheEntry, CacheStats, CacheStore, StatsRecorder};
use crate::config::Config;
use crate::content::Content;
use crate::error::Result;

// == Content Cache ==
/// Caching front for a [`ContentAuthority`].
///
/// Found content and remembered absences are both cached. How often a cached
/// entry is checked against the authority is governed by the validation
/// interval: `-1` never, `0` on every lookup, and a positive value at most
/// once per that many milliseconds.
pub struct ContentCache {
    authority: Arc<dyn ContentAuthority>,
    store: CacheStore,
    bounds: CacheBounds,
    stats: StatsRecorder,
}

impl ContentCache {
    // == Constructors ==
    /// Creates a cache with default bounds.
    pub fn new(authority: Arc<dyn ContentAuthority>) -> Self {
        Self::with_bounds(authority, CacheBounds::default())
    }

    pub fn with_config(authority: Arc<dyn ContentAuthority>, config: &Config) -> Self {
        Self::with_bounds(authority, CacheBounds::from_config(config))
    }

    pub fn with_bounds(authority: Arc<dyn ContentAuthority>, bounds: CacheBounds) -> Self {
        Self {
            authority,
            store: CacheStore::new(),
            bounds,
            stats: StatsRecorder::new(),
        }
    }

    // == Get Content ==
    /// Returns the content for `path`, or `None` if the authority has none.
    ///
    /// Authority failures propagate and are never cached. Content that is
    /// not cacheable is still returned. When several callers miss on the same
    /// path at once, all of them receive the single entry that won insertion.
    pub async fn get_content(&self, path: &str) -> Result<Option<Arc<Content>>> {
        if let Some(entry) = self.store.lookup(path) {
            entry.touch();
            if entry.is_valid(self.authority.as_ref()).await {
                self.stats.record_hit();
                return Ok(entry.content().cloned());
            }
            if self.store.remove_entry(&entry) {
                self.stats.record_invalidation();
                debug!(path, "invalidated cache entry");
            }
        }

        self.stats.record_miss();
        let resolved = self.authority.resolve(path).await?;

        if !self.is_cacheable(resolved.as_ref()) {
            self.stats.record_passthrough();
            trace!(path, "serving uncached content");
            return Ok(resolved.map(Arc::new));
        }

        let interval = self.bounds.validation_interval_ms();
        let (entry, inserted) = self.store.insert_if_absent(path, move || match resolved {
            Some(content) => CacheEntry::found(path, Arc::new(content), interval),
            None => CacheEntry::not_found(path, interval),
        });

        if inserted {
            debug!(
                path,
                length = entry.content_length(),
                not_found = entry.is_not_found(),
                "cached content"
            );
            self.shrink();
        } else {
            trace!(path, "lost insertion race, serving winning entry");
        }

        Ok(entry.content().cloned())
    }

    // == Cacheability ==
    /// Decides whether a resolution (or an absence, `None`) may be stored.
    pub fn is_cacheable(&self, content: Option<&Content>) -> bool {
        if self.bounds.max_cached_files() <= 0 {
            return false;
        }

        let Some(content) = content else {
            // An absence revalidated on every request would never be served.
            return self.bounds.validation_interval_ms() != 0;
        };

        if content.is_directory() {
            return false;
        }

        let len = i64::try_from(content.content_length()).unwrap_or(i64::MAX);
        if len <= 0 {
            return false;
        }
        if content.is_always_cacheable() {
            return true;
        }

        len <= self.bounds.max_cached_file_size() && len <= self.bounds.max_cache_size()
    }

    // == Flush ==
    /// Removes every entry. Returns how many were removed.
    pub fn flush_cache(&self) -> usize {
        let removed = self
            .store
            .keys()
            .iter()
            .filter(|key| self.store.remove(key).is_some())
            .count();
        debug!(removed, "flushed cache");
        removed
    }

    fn shrink(&self) {
        let evicted = lru::shrink(&self.store, &self.bounds);
        self.stats.record_evictions(evicted);
    }

    // == Introspection ==
    /// Total payload bytes currently held.
    pub fn cached_byte_count(&self) -> u64 {
        self.store.total_bytes()
    }

    /// Number of entries currently held, remembered absences included.
    pub fn cached_entry_count(&self) -> usize {
        self.store.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
            .snapshot(self.store.len(), self.store.total_bytes())
    }

    pub fn bounds(&self) -> &CacheBounds {
        &self.bounds
    }

    /// The underlying store, for inspection.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    // == Configuration ==
    pub fn set_max_cached_file_size(&self, value: i64) {
        self.bounds.set_max_cached_file_size(value);
        self.shrink();
    }

    pub fn set_max_cache_size(&self, value: i64) {
        self.bounds.set_max_cache_size(value);
        self.shrink();
    }

    pub fn set_max_cached_files(&self, value: i64) {
        self.bounds.set_max_cached_files(value);
        self.shrink();
    }

    /// Applies to entries created from now on; existing entries keep the
    /// interval they were created with.
    pub fn set_validation_interval(&self, millis: i64) {
        self.bounds.set_validation_interval_ms(millis);
    }
}

impl fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentCache")
            .field("store", &self.store)
            .field("bounds", &self.bounds)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
