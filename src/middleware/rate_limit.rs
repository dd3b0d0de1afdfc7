// src/middleware/rate_limit.rs
use std::{net::SocketAddr, time::Duration};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{self, HeaderMap, HeaderName, HeaderValue, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::services::rate_limiter::{RateDecision, RateLimiter};

pub const API_PREFIX: &str = "/api";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later.";

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Client identity with one trusted proxy hop: the address the proxy appended
/// to `X-Forwarded-For`, else the socket peer.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.rsplit(',').next())
        .map(str::trim)
        .filter(|addr| !addr.is_empty());

    match (forwarded, peer) {
        (Some(addr), _) => addr.to_string(),
        (None, Some(peer)) => peer.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

pub fn peer_addr<B>(req: &http::Request<B>) -> Option<SocketAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

fn is_api_path(path: &str) -> bool {
    path == API_PREFIX || path.starts_with("/api/")
}

fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

fn insert_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset: Duration) {
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(whole_seconds(reset)));
}

pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if !is_api_path(req.uri().path()) {
        return next.run(req).await;
    }

    let client = client_address(req.headers(), peer_addr(&req));
    match limiter.check(&client).await {
        RateDecision::Allowed {
            remaining,
            reset_after,
        } => {
            let mut response = next.run(req).await;
            insert_limit_headers(
                response.headers_mut(),
                limiter.max_requests(),
                remaining,
                reset_after,
            );
            response
        }
        RateDecision::Limited { retry_after } => {
            tracing::warn!(%client, path = %req.uri().path(), "rate limit exceeded");
            let mut response =
                (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE).into_response();
            let headers = response.headers_mut();
            insert_limit_headers(headers, limiter.max_requests(), 0, retry_after);
            headers.insert(RETRY_AFTER, HeaderValue::from(whole_seconds(retry_after)));
            response
        }
    }
}
