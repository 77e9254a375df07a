//! Content Authority Module
//!
//! The backend the cache sits in front of. An authority resolves a path to a
//! [`Content`] snapshot or reports that nothing exists there.

mod fs;
mod memory;

use std::time::SystemTime;

use async_trait::async_trait;

use crate::content::Content;
use crate::error::Result;

pub use fs::FileSystemAuthority;
pub use memory::MemoryAuthority;

// == Content Authority ==
/// Source of truth for path-addressed content.
#[async_trait]
pub trait ContentAuthority: Send + Sync {
    /// Resolves `path` to its current content, or `None` if absent.
    async fn resolve(&self, path: &str) -> Result<Option<Content>>;

    /// Returns the current last-modified instant for `path` without loading
    /// its payload. `None` when the path is absent or carries no instant.
    async fn last_modified(&self, path: &str) -> Result<Option<SystemTime>>;
}
