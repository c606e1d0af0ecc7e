//! Conversational assistant endpoint.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Optional draft the reply should be grounded in.
    #[serde(default)]
    pub resume: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /api/chat/complete
pub async fn complete_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".into()));
    }
    let reply =
        crate::llm::service::chat_reply(state.llm.as_ref(), &req.message, req.resume.as_ref())
            .await;
    Ok(Json(ChatResponse { reply }))
}
