//! Request DTOs for the content cache API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for PUT /config
///
/// Every field is optional; only the bounds that are present are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateConfigRequest {
    #[serde(default)]
    pub max_cached_file_size: Option<i64>,
    #[serde(default)]
    pub max_cache_size: Option<i64>,
    #[serde(default)]
    pub max_cached_files: Option<i64>,
    /// `-1`, `0`, or a positive number of milliseconds
    #[serde(default)]
    pub validation_interval_ms: Option<i64>,
}

impl UpdateConfigRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(interval) = self.validation_interval_ms {
            if interval < -1 {
                return Some("validation_interval_ms must be -1, 0 or positive".to_string());
            }
        }
        if self.max_cached_file_size.is_none()
            && self.max_cache_size.is_none()
            && self.max_cached_files.is_none()
            && self.validation_interval_ms.is_none()
        {
            return Some("No configuration values supplied".to_string());
        }
        None
    }
}
