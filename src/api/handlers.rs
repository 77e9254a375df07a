//! API Handlers
//!
//! HTTP request handlers for each content cache endpoint.

use std::sync::Arc;
use std::time::SystemTime;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};

use crate::authority::FileSystemAuthority;
use crate::cache::ContentCache;
use crate::config::Config;
use crate::content::Content;
use crate::error::{CacheError, Result};
use crate::models::{
    ConfigResponse, FlushResponse, HealthResponse, StatsResponse, UpdateConfigRequest,
};

/// Application state shared across all handlers.
///
/// The cache is internally synchronized, so handlers share it through a
/// plain `Arc` with no outer lock.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ContentCache>,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: ContentCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState serving `config.content_root` from disk.
    pub fn from_config(config: &Config) -> Self {
        let authority = FileSystemAuthority::new(config.content_root.clone())
            .with_file_mapping(config.use_file_mapping);
        Self::new(ContentCache::with_config(Arc::new(authority), config))
    }
}

/// Handler for GET /content/*path
///
/// Serves the content for `path` through the cache.
pub async fn content_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response> {
    let path = format!("/{}", path.trim_start_matches('/'));
    match state.cache.get_content(&path).await? {
        Some(content) => Ok(content_response(&content)),
        None => Err(CacheError::NotFound(path)),
    }
}

fn content_response(content: &Content) -> Response {
    let mut headers = HeaderMap::new();
    if let Some(value) = content.content_type().and_then(|v| HeaderValue::from_str(&v).ok()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Some(value) = content.etag().and_then(|v| HeaderValue::from_str(v).ok()) {
        headers.insert(header::ETAG, value);
    }
    if let Some(value) = content
        .last_modified()
        .and_then(|t| HeaderValue::from_str(&http_date(t)).ok())
    {
        headers.insert(header::LAST_MODIFIED, value);
    }

    (headers, Body::from(content.data().clone())).into_response()
}

fn http_date(instant: SystemTime) -> String {
    DateTime::<Utc>::from(instant)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for DELETE /cache
pub async fn flush_handler(State(state): State<AppState>) -> Json<FlushResponse> {
    Json(FlushResponse::new(state.cache.flush_cache()))
}

/// Handler for PUT /config
///
/// Applies the supplied bounds; shrinking bounds evicts immediately.
pub async fn config_handler(
    State(state): State<AppState>,
    Json(req): Json<UpdateConfigRequest>,
) -> Result<Json<ConfigResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let cache = &state.cache;
    if let Some(value) = req.validation_interval_ms {
        cache.set_validation_interval(value);
    }
    if let Some(value) = req.max_cached_file_size {
        cache.set_max_cached_file_size(value);
    }
    if let Some(value) = req.max_cache_size {
        cache.set_max_cache_size(value);
    }
    if let Some(value) = req.max_cached_files {
        cache.set_max_cached_files(value);
    }

    Ok(Json(ConfigResponse::from(cache.bounds())))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
