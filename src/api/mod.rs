//! API Module
//!
//! HTTP handlers and routing that expose the content cache.
//!
//! # Endpoints
//! - `GET /content/*path` - Serve content through the cache
//! - `GET /stats` - Get cache statistics
//! - `DELETE /cache` - Flush the cache
//! - `PUT /config` - Adjust cache bounds
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
