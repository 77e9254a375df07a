//! Cache Module
//!
//! Provides a bounded, concurrently accessed cache of path-addressed content
//! with negative caching, LRU eviction and interval-based revalidation.

mod bounds;
mod entry;
mod factory;
pub mod lru;
mod stats;
mod store;


// Re-export public types
pub use bounds::CacheBounds;
pub use entry::{CacheEntry, Validity};
pub use factory::ContentCache;
pub use stats::{CacheStats, StatsRecorder};
pub use store::CacheStore;
