//! In-memory content authority.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use super::ContentAuthority;
use crate::content::Content;
use crate::error::{CacheError, Result};

/// A path → content map held in process memory.
///
/// Counts calls to [`ContentAuthority::resolve`] and can be told to fail, which
/// makes it the backend of choice for exercising the cache.
#[derive(Debug, Default)]
pub struct MemoryAuthority {
    contents: RwLock<HashMap<String, Content>>,
    failure: RwLock<Option<String>>,
    resolve_calls: AtomicUsize,
    last_modified_calls: AtomicUsize,
}

impl MemoryAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `content` under `path`, replacing any previous value.
    pub fn insert(&self, path: impl Into<String>, content: Content) {
        self.write().insert(path.into(), content);
    }

    pub fn remove(&self, path: &str) -> Option<Content> {
        self.write().remove(path)
    }

    /// Advances the last-modified instant of `path` by one second, simulating
    /// an in-place update of the resource.
    pub fn touch(&self, path: &str) {
        let mut contents = self.write();
        if let Some(content) = contents.get_mut(path) {
            let next = content
                .last_modified()
                .unwrap_or(SystemTime::UNIX_EPOCH)
                + Duration::from_secs(1);
            *content = content.clone().with_last_modified(next);
        }
    }

    /// Makes every subsequent call fail with `message`; `None` restores
    /// normal operation.
    pub fn fail_with(&self, message: Option<&str>) {
        *self.failure.write().unwrap_or_else(|e| e.into_inner()) = message.map(str::to_string);
    }

    /// Number of `resolve` calls served so far.
    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    /// Number of `last_modified` calls served so far.
    pub fn last_modified_calls(&self) -> usize {
        self.last_modified_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            Some(message) => Err(CacheError::Authority(message.clone())),
            None => Ok(()),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Content>> {
        self.contents.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Content>> {
        self.contents.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ContentAuthority for MemoryAuthority {
    async fn resolve(&self, path: &str) -> Result<Option<Content>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.read().get(path).cloned())
    }

    async fn last_modified(&self, path: &str) -> Result<Option<SystemTime>> {
        self.last_modified_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.read().get(path).and_then(Content::last_modified))
    }
}
