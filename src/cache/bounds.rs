//! Cache Bounds Module
//!
//! Size, count and staleness limits shared by every caller of a cache.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::config::{
    Config, DEFAULT_MAX_CACHED_FILES, DEFAULT_MAX_CACHED_FILE_SIZE, DEFAULT_MAX_CACHE_SIZE,
    DEFAULT_VALIDATION_INTERVAL_MS,
};

// == Cache Bounds ==
/// Runtime-adjustable limits. Each value is read independently; a check
/// racing a setter may observe the old or the new value.
#[derive(Debug)]
pub struct CacheBounds {
    max_cached_file_size: AtomicI64,
    max_cache_size: AtomicI64,
    max_cached_files: AtomicI64,
    validation_interval_ms: AtomicI64,
}

impl CacheBounds {
    pub fn new(
        max_cached_file_size: i64,
        max_cache_size: i64,
        max_cached_files: i64,
        validation_interval_ms: i64,
    ) -> Self {
        Self {
            max_cached_file_size: AtomicI64::new(max_cached_file_size),
            max_cache_size: AtomicI64::new(max_cache_size),
            max_cached_files: AtomicI64::new(max_cached_files),
            validation_interval_ms: AtomicI64::new(validation_interval_ms),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_cached_file_size,
            config.max_cache_size,
            config.max_cached_files,
            config.validation_interval_ms,
        )
    }

    pub fn max_cached_file_size(&self) -> i64 {
        self.max_cached_file_size.load(Ordering::Acquire)
    }

    pub fn set_max_cached_file_size(&self, value: i64) {
        self.max_cached_file_size.store(value, Ordering::Release);
    }

    pub fn max_cache_size(&self) -> i64 {
        self.max_cache_size.load(Ordering::Acquire)
    }

    pub fn set_max_cache_size(&self, value: i64) {
        self.max_cache_size.store(value, Ordering::Release);
    }

    pub fn max_cached_files(&self) -> i64 {
        self.max_cached_files.load(Ordering::Acquire)
    }

    pub fn set_max_cached_files(&self, value: i64) {
        self.max_cached_files.store(value, Ordering::Release);
    }

    pub fn validation_interval_ms(&self) -> i64 {
        self.validation_interval_ms.load(Ordering::Acquire)
    }

    pub fn set_validation_interval_ms(&self, value: i64) {
        self.validation_interval_ms.store(value, Ordering::Release);
    }

    // == Satisfied ==
    /// True when `entries` and `bytes` are within the count and size bounds.
    pub fn satisfied_by(&self, entries: usize, bytes: u64) -> bool {
        let entries = i64::try_from(entries).unwrap_or(i64::MAX);
        let bytes = i64::try_from(bytes).unwrap_or(i64::MAX);
        entries <= self.max_cached_files() && bytes <= self.max_cache_size()
    }
}

impl Default for CacheBounds {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_CACHED_FILE_SIZE,
            DEFAULT_MAX_CACHE_SIZE,
            DEFAULT_MAX_CACHED_FILES,
            DEFAULT_VALIDATION_INTERVAL_MS,
        )
    }
}
