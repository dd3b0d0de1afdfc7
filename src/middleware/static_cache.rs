//! Cache headers for the static asset tree.
//!
//! Adds `Cache-Control` and a weak `ETag` (size + modification time) to
//! successful file responses, and answers matching `If-None-Match` with 304.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, ETAG, IF_NONE_MATCH, LAST_MODIFIED},
    },
    middleware::Next,
    response::Response,
};

/// One hour.
pub const STATIC_CACHE_CONTROL: &str = "public, max-age=3600";
/// The SPA document is revalidated on every load.
pub const DOCUMENT_CACHE_CONTROL: &str = "public, max-age=0";

/// Weak `ETag` from content length and `Last-Modified`.
pub fn weak_etag(content_length: u64, last_modified: &str) -> String {
    let mut hasher = DefaultHasher::new();
    last_modified.hash(&mut hasher);
    format!("W/\"{content_length:x}-{:x}\"", hasher.finish())
}

/// Weak comparison against a client `If-None-Match` list, `*` included.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    let opaque = |tag: &str| tag.trim().trim_start_matches("W/").to_string();
    if_none_match.is_some_and(|client| {
        client
            .split(',')
            .any(|tag| tag.trim() == "*" || opaque(tag) == opaque(etag))
    })
}

fn content_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .or_else(|| response.body().size_hint().exact())
}

fn not_modified(headers: &HeaderMap) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NOT_MODIFIED;
    for name in [ETAG, CACHE_CONTROL, LAST_MODIFIED] {
        if let Some(value) = headers.get(&name) {
            response.headers_mut().insert(name, value.clone());
        }
    }
    response
}

pub async fn static_cache(req: Request, next: Next) -> Response {
    let if_none_match = req
        .headers()
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let mut response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    response
        .headers_mut()
        .entry(CACHE_CONTROL)
        .or_insert_with(|| HeaderValue::from_static(STATIC_CACHE_CONTROL));

    let last_modified = response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let (Some(length), Some(last_modified)) = (content_length(&response), last_modified) else {
        return response;
    };

    let etag = weak_etag(length, &last_modified);
    if let Ok(value) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert(ETAG, value);
    }

    if check_etag_match(if_none_match.as_deref(), &etag) {
        return not_modified(response.headers());
    }
    response
}
