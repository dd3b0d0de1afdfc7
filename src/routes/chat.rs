use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    state::SharedState,
};

/// `POST /api/chat`: validate, attach the server credential, forward once.
pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(body) = payload.map_err(AppError::from_rejection)?;
    let request = ChatRequest::from_json(body)?;

    let api_key = state.api_key().ok_or(AppError::MissingApiKey)?;

    let completion = state
        .completions
        .complete(api_key, &request.into_completion())
        .await?;

    Ok(Json(ChatResponse::success(completion.first_reply())))
}
