// src/middleware/mod.rs
pub mod access_log;
pub mod rate_limit;
pub mod security;
pub mod static_cache;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, CorsLayer};

/// 1 MB cap on request bodies.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// CORS for a single configured origin. Without one, no CORS layer is installed
/// and browsers keep their same-origin default.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}
