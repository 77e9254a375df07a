//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from
//! environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default per-file size limit (128 MiB)
pub const DEFAULT_MAX_CACHED_FILE_SIZE: i64 = 128 * 1024 * 1024;
/// Default total cache size limit (256 MiB)
pub const DEFAULT_MAX_CACHE_SIZE: i64 = 256 * 1024 * 1024;
/// Default maximum number of cached entries
pub const DEFAULT_MAX_CACHED_FILES: i64 = 2048;
/// Default validation interval: revalidate on every access
pub const DEFAULT_VALIDATION_INTERVAL_MS: i64 = 0;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Largest single payload admitted to the cache, in bytes
    pub max_cached_file_size: i64,
    /// Total payload bytes the cache may hold
    pub max_cache_size: i64,
    /// Maximum number of entries; `<= 0` disables caching
    pub max_cached_files: i64,
    /// `-1` never revalidate, `0` revalidate on every access, `>0` minimum
    /// milliseconds between revalidations
    pub validation_interval_ms: i64,
    /// Directory served by the filesystem authority
    pub content_root: PathBuf,
    /// Memory-map files instead of reading them onto the heap
    pub use_file_mapping: bool,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_CACHED_FILE_SIZE` - Per-file limit in bytes (default: 128 MiB)
    /// - `MAX_CACHE_SIZE` - Total limit in bytes (default: 256 MiB)
    /// - `MAX_CACHED_FILES` - Entry limit (default: 2048)
    /// - `VALIDATION_INTERVAL_MS` - Revalidation interval (default: 0)
    /// - `CONTENT_ROOT` - Directory to serve (default: `.`)
    /// - `USE_FILE_MAPPING` - Memory-map served files (default: false)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_cached_file_size: env_or("MAX_CACHED_FILE_SIZE", defaults.max_cached_file_size),
            max_cache_size: env_or("MAX_CACHE_SIZE", defaults.max_cache_size),
            max_cached_files: env_or("MAX_CACHED_FILES", defaults.max_cached_files),
            validation_interval_ms: env_or(
                "VALIDATION_INTERVAL_MS",
                defaults.validation_interval_ms,
            ),
            content_root: env::var("CONTENT_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.content_root),
            use_file_mapping: env_or("USE_FILE_MAPPING", defaults.use_file_mapping),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cached_file_size: DEFAULT_MAX_CACHED_FILE_SIZE,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            max_cached_files: DEFAULT_MAX_CACHED_FILES,
            validation_interval_ms: DEFAULT_VALIDATION_INTERVAL_MS,
            content_root: PathBuf::from("."),
            use_file_mapping: false,
            server_port: 3000,
        }
    }
}
