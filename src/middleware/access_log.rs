//! Per-request access log built on `tower_http::trace`.
//!
//! Development records carry the request headers; production records follow
//! the combined log layout (client, method, uri, status, referer, user agent).

use std::time::Duration;

use axum::http::{
    HeaderMap, Request, Response,
    header::{REFERER, USER_AGENT},
};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultOnRequest, MakeSpan, OnResponse, TraceLayer},
};
use tracing::Span;
use uuid::Uuid;

use super::rate_limit::{client_address, peer_addr};
use crate::config::AppMode;

#[derive(Debug, Clone, Copy)]
pub struct AccessLog {
    mode: AppMode,
}

impl AccessLog {
    pub fn new(mode: AppMode) -> Self {
        Self { mode }
    }
}

fn header_or_dash<'a>(headers: &'a HeaderMap, name: axum::http::HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

impl<B> MakeSpan<B> for AccessLog {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let id = Uuid::new_v4();
        match self.mode {
            AppMode::Development => tracing::info_span!(
                "request",
                %id,
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                headers = ?request.headers(),
            ),
            AppMode::Production => tracing::info_span!(
                "request",
                %id,
                remote_addr = %client_address(request.headers(), peer_addr(request)),
                method = %request.method(),
                uri = %request.uri(),
                referer = %header_or_dash(request.headers(), REFERER),
                user_agent = %header_or_dash(request.headers(), USER_AGENT),
            ),
        }
    }
}

impl<B> OnResponse<B> for AccessLog {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        let status = response.status().as_u16();
        match self.mode {
            AppMode::Development => tracing::info!(
                status,
                latency_ms = latency.as_secs_f64() * 1000.0,
                headers = ?response.headers(),
                "response sent"
            ),
            AppMode::Production => tracing::info!(
                status,
                latency_ms = latency.as_millis() as u64,
                "response sent"
            ),
        }
    }
}

pub type AccessLogLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, AccessLog, DefaultOnRequest, AccessLog>;

pub fn access_log_layer(mode: AppMode) -> AccessLogLayer {
    TraceLayer::new_for_http()
        .make_span_with(AccessLog::new(mode))
        .on_response(AccessLog::new(mode))
}
