//! Cache Entry Module
//!
//! Defines cached entries (found content or a remembered absence) together
//! with the revalidation protocol that decides whether an entry may still be
//! served.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Instant, SystemTime};

use tracing::{debug, warn};

use crate::authority::ContentAuthority;
use crate::content::Content;

// == Entry Kind ==
/// What a cache entry remembers about its path.
#[derive(Debug)]
enum EntryKind {
    /// The authority produced content; the snapshot is shared with readers.
    Found(Arc<Content>),
    /// The authority reported nothing at this path.
    NotFound,
}

// == Validity ==
/// Outcome of the local (backend-free) part of a validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Serve the entry without consulting the backend.
    Fresh,
    /// The entry must be discarded.
    Stale,
    /// This caller owns the revalidation slot and must compare against the
    /// backend.
    Revalidate,
}

// == Cache Entry ==
/// A single cached path.
///
/// Everything except the two access timestamps is fixed at construction.
#[derive(Debug)]
pub struct CacheEntry {
    key: String,
    kind: EntryKind,
    /// Copied from configuration when the entry is created
    validation_interval_ms: i64,
    /// Monotonic nanoseconds, updated on every lookup hit
    last_accessed: AtomicU64,
    /// Monotonic nanoseconds, updated when a revalidation is claimed
    last_validated: AtomicU64,
}

impl CacheEntry {
    // == Constructors ==
    /// Creates an entry holding found content.
    pub fn found(key: impl Into<String>, content: Arc<Content>, validation_interval_ms: i64) -> Self {
        Self::with_kind(key.into(), EntryKind::Found(content), validation_interval_ms)
    }

    /// Creates an entry remembering that `key` does not exist.
    pub fn not_found(key: impl Into<String>, validation_interval_ms: i64) -> Self {
        Self::with_kind(key.into(), EntryKind::NotFound, validation_interval_ms)
    }

    fn with_kind(key: String, kind: EntryKind, validation_interval_ms: i64) -> Self {
        let now = monotonic_nanos();
        Self {
            key,
            kind,
            validation_interval_ms,
            last_accessed: AtomicU64::new(now),
            last_validated: AtomicU64::new(now),
        }
    }

    // == Accessors ==
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The cached content, or `None` for a remembered absence.
    pub fn content(&self) -> Option<&Arc<Content>> {
        match &self.kind {
            EntryKind::Found(content) => Some(content),
            EntryKind::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, EntryKind::NotFound)
    }

    /// Bytes this entry counts against the cache size bound.
    pub fn content_length(&self) -> u64 {
        match &self.kind {
            EntryKind::Found(content) => content.content_length(),
            EntryKind::NotFound => 0,
        }
    }

    pub fn last_accessed(&self) -> u64 {
        self.last_accessed.load(Ordering::Acquire)
    }

    pub fn last_validated(&self) -> u64 {
        self.last_validated.load(Ordering::Acquire)
    }

    // == Touch ==
    /// Records an access for LRU ordering.
    pub fn touch(&self) {
        self.last_accessed.store(monotonic_nanos(), Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn set_last_accessed(&self, nanos: u64) {
        self.last_accessed.store(nanos, Ordering::Release);
    }

    // == Check ==
    /// Applies the staleness policy without touching the backend.
    ///
    /// With a positive interval, at most one caller per elapsed interval wins
    /// the compare-and-swap on `last_validated` and gets [`Validity::Revalidate`];
    /// every other caller sees the entry as fresh.
    pub fn check(&self) -> Validity {
        let interval = self.validation_interval_ms;
        if interval < 0 {
            return Validity::Fresh;
        }

        let now = monotonic_nanos();
        let interval_nanos = (interval as u64).saturating_mul(1_000_000);

        match self.kind {
            EntryKind::NotFound => {
                // Absence is never reconfirmed, it only expires.
                let since = now.saturating_sub(self.last_validated());
                if interval > 0 && since < interval_nanos {
                    Validity::Fresh
                } else {
                    Validity::Stale
                }
            }
            EntryKind::Found(_) if interval == 0 => {
                self.last_validated.store(now, Ordering::Release);
                Validity::Revalidate
            }
            EntryKind::Found(_) => {
                let previous = self.last_validated();
                if now.saturating_sub(previous) <= interval_nanos {
                    return Validity::Fresh;
                }
                match self.last_validated.compare_exchange(
                    previous,
                    now,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => Validity::Revalidate,
                    Err(_) => Validity::Fresh,
                }
            }
        }
    }

    /// Compares the captured last-modified instant with the backend's
    /// current one.
    pub fn matches_last_modified(&self, current: Option<SystemTime>) -> bool {
        match &self.kind {
            EntryKind::Found(content) => content.last_modified() == current,
            EntryKind::NotFound => false,
        }
    }

    // == Is Valid ==
    /// Full validity check, consulting `authority` only when this caller
    /// won the revalidation slot.
    ///
    /// A backend failure during revalidation counts as invalid so the entry is
    /// replaced by a fresh resolution.
    pub async fn is_valid(&self, authority: &dyn ContentAuthority) -> bool {
        match self.check() {
            Validity::Fresh => true,
            Validity::Stale => false,
            Validity::Revalidate => match authority.last_modified(&self.key).await {
                Ok(current) => {
                    let valid = self.matches_last_modified(current);
                    if !valid {
                        debug!(key = %self.key, "cached content modified at source");
                    }
                    valid
                }
                Err(e) => {
                    warn!(key = %self.key, error = %e, "revalidation failed");
                    false
                }
            },
        }
    }
}

// == Utility Functions ==
/// Nanoseconds elapsed on a process-wide monotonic clock.
pub(crate) fn monotonic_nanos() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::MemoryAuthority;
    use std::thread::sleep;
    use std::time::Duration;

    fn content() -> Arc<Content> {
        Arc::new(Content::new("payload").with_last_modified(SystemTime::UNIX_EPOCH))
    }

    fn authority_with(path: &str) -> MemoryAuthority {
        let authority = MemoryAuthority::new();
        authority.insert(path, Content::new("payload").with_last_modified(SystemTime::UNIX_EPOCH));
        authority
    }

    #[test]
    fn test_found_entry_length() {
        let entry = CacheEntry::found("/a", content(), 0);
        assert_eq!(entry.key(), "/a");
        assert_eq!(entry.content_length(), 7);
        assert!(entry.content().is_some());
        assert!(!entry.is_not_found());
    }

    #[test]
    fn test_not_found_entry_length() {
        let entry = CacheEntry::not_found("/missing", 100);
        assert_eq!(entry.content_length(), 0);
        assert!(entry.content().is_none());
        assert!(entry.is_not_found());
    }

    #[test]
    fn test_sticky_entry_always_fresh() {
        let entry = CacheEntry::found("/a", content(), -1);
        for _ in 0..1000 {
            assert_eq!(entry.check(), Validity::Fresh);
        }
    }

    #[test]
    fn test_zero_interval_always_revalidates() {
        let entry = CacheEntry::found("/a", content(), 0);
        for _ in 0..10 {
            assert_eq!(entry.check(), Validity::Revalidate);
        }
    }

    #[test]
    fn test_positive_interval_claims_once() {
        let entry = CacheEntry::found("/a", content(), 20);
        assert_eq!(entry.check(), Validity::Fresh);

        sleep(Duration::from_millis(30));

        assert_eq!(entry.check(), Validity::Revalidate);
        // The slot was just claimed, so the next caller is served as fresh.
        assert_eq!(entry.check(), Validity::Fresh);
    }

    #[test]
    fn test_not_found_expires() {
        let entry = CacheEntry::not_found("/missing", 50);
        assert_eq!(entry.check(), Validity::Fresh);

        sleep(Duration::from_millis(60));

        assert_eq!(entry.check(), Validity::Stale);
    }

    #[test]
    fn test_not_found_zero_interval_is_stale() {
        let entry = CacheEntry::not_found("/missing", 0);
        assert_eq!(entry.check(), Validity::Stale);
    }

    #[test]
    fn test_touch_moves_last_accessed_forward() {
        let entry = CacheEntry::found("/a", content(), 0);
        let before = entry.last_accessed();
        sleep(Duration::from_millis(2));
        entry.touch();
        assert!(entry.last_accessed() > before);
    }

    #[tokio::test]
    async fn test_is_valid_detects_modification() {
        let authority = authority_with("/a");
        let entry = CacheEntry::found("/a", content(), 0);

        assert!(entry.is_valid(&authority).await);

        authority.touch("/a");
        assert!(!entry.is_valid(&authority).await);
    }

    #[tokio::test]
    async fn test_sticky_entry_ignores_backend_changes() {
        let authority = authority_with("/a");
        let entry = CacheEntry::found("/a", content(), -1);

        for _ in 0..1000 {
            authority.touch("/a");
            assert!(entry.is_valid(&authority).await);
        }
        assert_eq!(authority.last_modified_calls(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_invalidates() {
        let authority = authority_with("/a");
        let entry = CacheEntry::found("/a", content(), 0);

        authority.fail_with(Some("boom"));
        assert!(!entry.is_valid(&authority).await);
    }

    #[tokio::test]
    async fn test_deleted_source_invalidates() {
        let authority = authority_with("/a");
        let entry = CacheEntry::found("/a", content(), 0);

        authority.remove("/a");
        assert!(!entry.is_valid(&authority).await);
    }
}
