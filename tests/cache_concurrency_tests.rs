//! Concurrency Tests for the Content Cache
//!
//! Drives the cache from many tasks on a multi-threaded runtime.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use content_cache::cache::{CacheBounds, ContentCache};
use content_cache::{Content, MemoryAuthority};

fn setup(bounds: CacheBounds) -> (Arc<MemoryAuthority>, Arc<ContentCache>) {
    let authority = Arc::new(MemoryAuthority::new());
    let cache = Arc::new(ContentCache::with_bounds(authority.clone(), bounds));
    (authority, cache)
}

fn file(len: usize) -> Content {
    Content::new(vec![b'z'; len]).with_last_modified(SystemTime::UNIX_EPOCH)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_misses_install_one_entry() {
    let (authority, cache) = setup(CacheBounds::new(1 << 20, 1 << 20, 100, -1));
    authority.insert("/shared", file(256));

    let handles: Vec<_> = (0..64)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_content("/shared").await.unwrap().unwrap() })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(cache.cached_entry_count(), 1);
    assert_eq!(cache.cached_byte_count(), 256);

    // Every caller, winner or not, got the single cached snapshot.
    let cached = cache.get_content("/shared").await.unwrap().unwrap();
    assert!(results.iter().all(|c| Arc::ptr_eq(c, &cached)));
    assert!(authority.resolve_calls() >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_negative_misses_install_one_entry() {
    let (_, cache) = setup(CacheBounds::new(1 << 20, 1 << 20, 100, 10_000));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_content("/absent").await.unwrap() })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_none());
    }
    assert_eq!(cache.cached_entry_count(), 1);
    assert_eq!(cache.cached_byte_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_bounds_hold_under_concurrent_growth() {
    let (authority, cache) = setup(CacheBounds::new(1024, 2048, 16, -1));
    for i in 0..200 {
        authority.insert(format!("/f{i}"), file(64 + i % 64));
    }

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for i in 0..200 {
                    let path = format!("/f{}", (i * 7 + worker * 13) % 200);
                    cache.get_content(&path).await.unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    // With no operation in flight the counters are exact.
    assert!(cache.cached_entry_count() <= 16);
    assert!(cache.cached_byte_count() <= 2048);

    let total: u64 = cache
        .store()
        .snapshot_values()
        .iter()
        .map(|entry| entry.content_length())
        .sum();
    assert_eq!(cache.cached_byte_count(), total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_survive_concurrent_flush() {
    let (authority, cache) = setup(CacheBounds::new(1 << 20, 1 << 20, 100, -1));
    authority.insert("/payload", Content::new(vec![42u8; 8192]));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                let content = cache.get_content("/payload").await.unwrap().unwrap();
                if i % 2 == 0 {
                    cache.flush_cache();
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
                content.data().iter().all(|b| *b == 42) && content.content_length() == 8192
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_revalidation_runs_once_per_interval() {
    let (authority, cache) = setup(CacheBounds::new(1 << 20, 1 << 20, 100, 200));
    authority.insert("/a", file(16));
    cache.get_content("/a").await.unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_content("/a").await.unwrap() })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_some());
    }

    assert_eq!(authority.last_modified_calls(), 1);
    assert_eq!(authority.resolve_calls(), 1);
}
