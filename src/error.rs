//! Error types for the content cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the content cache and its HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The content authority failed to resolve a path
    #[error("Authority error: {0}")]
    Authority(String),

    /// I/O failure while reading from the backing store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path escapes the content root or is otherwise malformed
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// No content exists for the requested path
    #[error("Content not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidPath(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Authority(_) | CacheError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the content cache.
pub type Result<T> = std::result::Result<T, CacheError>;
