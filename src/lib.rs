//! Content Cache - A bounded cache in front of a path-addressed content store
//!
//! Answers "what is the content for this path" while avoiding repeated
//! resolution, bounding memory use, remembering absent paths, and
//! periodically revalidating entries against the backend.

pub mod api;
pub mod authority;
pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod models;

pub use api::AppState;
pub use authority::{ContentAuthority, FileSystemAuthority, MemoryAuthority};
pub use cache::ContentCache;
pub use config::Config;
pub use content::{Compression, Content};
pub use error::{CacheError, Result};
