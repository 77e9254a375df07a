//! Response DTOs for the content cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheBounds, CacheStats};

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
    pub passthroughs: u64,
    pub total_entries: usize,
    pub total_bytes: u64,
    /// Cache hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            invalidations: stats.invalidations,
            passthroughs: stats.passthroughs,
            total_entries: stats.total_entries,
            total_bytes: stats.total_bytes,
        }
    }
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    /// Success message
    pub message: String,
    /// Number of entries removed
    pub removed: usize,
}

impl FlushResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            message: format!("Flushed {} cache entries", removed),
            removed,
        }
    }
}

/// Response body for PUT /config: the bounds now in force
#[derive(Debug, Clone, Serialize)]
pub struct ConfigResponse {
    pub max_cached_file_size: i64,
    pub max_cache_size: i64,
    pub max_cached_files: i64,
    pub validation_interval_ms: i64,
}

impl From<&CacheBounds> for ConfigResponse {
    fn from(bounds: &CacheBounds) -> Self {
        Self {
            max_cached_file_size: bounds.max_cached_file_size(),
            max_cache_size: bounds.max_cache_size(),
            max_cached_files: bounds.max_cached_files(),
            validation_interval_ms: bounds.validation_interval_ms(),
        }
    }
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status ("healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
