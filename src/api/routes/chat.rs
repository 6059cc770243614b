use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    pub document_id: Option<String>,
    pub document_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// Answers a question against an uploaded document: retrieval when
/// `document_id` is given, otherwise whatever `document_text` the client
/// still holds.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let assistant = state
        .assistant
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("AI service is not available, set OPENAI_API_KEY"))?;
    if request.question.trim().is_empty() {
        return Err(ApiError::bad_request("question is required"));
    }

    let answer = assistant
        .answer(
            &request.question,
            request.document_id.as_deref(),
            request.document_text.as_deref(),
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "chat completion failed");
            ApiError::from(e)
        })?;

    Ok(Json(ChatResponse { answer }))
}
