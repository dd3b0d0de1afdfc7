// src/error.rs
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::ChatResponse;
use crate::services::openai::UpstreamError;

pub const MESSAGES_MUST_BE_ARRAY: &str = "messages must be an array";

/// Caller-visible text for every upstream failure.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Coach error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Server missing OPENAI_API_KEY")]
    MissingApiKey,

    #[error("upstream completion failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Body(JsonRejection),
}

impl AppError {
    /// Oversized bodies keep their own status, anything else unreadable is a bad payload.
    pub fn from_rejection(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::Body(rejection)
        } else {
            Self::InvalidPayload(MESSAGES_MUST_BE_ARRAY.to_string())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::MissingApiKey | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Body(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Body(rejection) => return rejection.into_response(),
            Self::Upstream(err) => {
                tracing::error!(error = %err, "chat proxy error");
                UPSTREAM_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ChatResponse::failure(message))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
