// src/routes/mod.rs
pub mod chat;

use axum::{
    Router,
    http::{HeaderValue, header::CACHE_CONTROL},
    middleware,
    routing::{get, post},
};
use chat::chat_handler;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
};

use crate::middleware::{
    BODY_LIMIT_BYTES,
    access_log::access_log_layer,
    cors_layer,
    rate_limit::rate_limit,
    security::security_headers,
    static_cache::{DOCUMENT_CACHE_CONTROL, static_cache},
};
use crate::state::SharedState;

pub const INDEX_DOCUMENT: &str = "index.html";

pub fn create_router(state: SharedState) -> Router {
    let config = &state.config;

    // Unknown paths get the SPA document so client-side routing works.
    let index = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(DOCUMENT_CACHE_CONTROL),
        ))
        .service(ServeFile::new(config.public_dir.join(INDEX_DOCUMENT)));
    let static_files = ServiceBuilder::new()
        .layer(middleware::from_fn(static_cache))
        .service(ServeDir::new(&config.public_dir).fallback(index));

    let router = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/api/chat", post(chat_handler))
        .fallback_service(static_files)
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit,
        ))
        .with_state(state.clone());

    let router = match config.cors_origin.clone() {
        Some(origin) => router.layer(cors_layer(origin)),
        None => router,
    };

    router
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(access_log_layer(config.mode))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(security_headers))
}
