// src/message.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, MESSAGES_MUST_BE_ARRAY};
use crate::services::openai::CompletionRequest;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.2;
/// Output cap applied to every upstream call. Callers cannot raise it.
pub const MAX_TOKENS: u32 = 600;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    pub messages: Vec<Value>,
}

impl ChatRequest {
    /// Validate a raw JSON body. The `messages` check runs first so its
    /// message wins over any type error in the other fields.
    pub fn from_json(body: Value) -> Result<Self, AppError> {
        if !body.get("messages").is_some_and(Value::is_array) {
            return Err(AppError::InvalidPayload(MESSAGES_MUST_BE_ARRAY.to_string()));
        }

        serde_json::from_value(body).map_err(|err| AppError::InvalidPayload(err.to_string()))
    }

    pub fn into_completion(self) -> CompletionRequest {
        CompletionRequest {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            messages: self.messages,
            max_tokens: MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn success(reply: impl Into<String>) -> Self {
        Self {
            ok: true,
            reply: Some(reply.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            reply: None,
            error: Some(error.into()),
        }
    }
}
