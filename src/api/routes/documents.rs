use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::domain::{ChunkMatch, IndexStats, StoredChunk};
use crate::infrastructure::extract;

const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub document_id: String,
    pub summary: String,
    pub original_text: String,
    pub filename: String,
    pub file_type: String,
    pub vector_db_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub document_id: Option<String>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ChunkMatch>,
}

#[derive(Debug, Serialize)]
pub struct ChunksResponse {
    pub document_id: String,
    pub chunks: Vec<StoredChunk>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub removed_chunks: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub available: bool,
    #[serde(flatten)]
    pub stats: Option<IndexStats>,
}

/// Multipart upload (field `document`): extract text, index it, summarize.
/// `vector_db_enabled` in the response reports whether this document really
/// landed in the index, not just whether one is configured.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let assistant = state
        .assistant
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("AI service is not available, set OPENAI_API_KEY"))?;

    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        if field.name() == Some("document") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| ApiError::bad_request("no file selected"))?;
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
            upload = Some((filename, data));
        }
    }
    let (filename, data) =
        upload.ok_or_else(|| ApiError::bad_request("multipart field 'document' is required"))?;

    let file_type = extract::supported_extension(&filename).ok_or_else(|| {
        ApiError::bad_request("invalid file type, only pdf, txt and markdown are supported")
    })?;
    let limit = state.config.config.server.max_upload_bytes;
    if data.len() > limit {
        return Err(ApiError::payload_too_large(format!(
            "file exceeds the {limit} byte upload limit"
        )));
    }

    let text = extract::extract_text(&filename, &data)?;
    let document_id = Uuid::new_v4().to_string();

    let outcome = assistant
        .summarize_document(&document_id, &filename, &text)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "summary generation failed");
            ApiError::from(e)
        })?;

    Ok(Json(UploadResponse {
        document_id,
        summary: outcome.summary,
        original_text: preview(&text),
        filename,
        file_type,
        vector_db_enabled: outcome.indexed_chunks.is_some(),
    }))
}

pub async fn search_documents(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let store = state
        .vector_store
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("vector database is not available"))?;
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query is required"));
    }

    let top_k = request
        .top_k
        .unwrap_or(state.config.config.assistant.search_top_k);
    let results = store
        .search(&request.query, request.document_id.as_deref(), top_k)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "search failed");
            ApiError::from(e)
        })?;

    Ok(Json(SearchResponse { results }))
}

pub async fn get_document_chunks(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<ChunksResponse>, ApiError> {
    let store = state
        .vector_store
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("vector database is not available"))?;

    let chunks = store.list_chunks(&document_id).await.map_err(|e| {
        tracing::error!(error = %e, "chunk listing failed");
        ApiError::from(e)
    })?;

    Ok(Json(ChunksResponse {
        document_id,
        chunks,
    }))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let store = state
        .vector_store
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("vector database is not available"))?;

    let removed_chunks = store.delete(&document_id).await.map_err(|e| {
        tracing::error!(error = %e, "delete failed");
        ApiError::from(e)
    })?;

    Ok(Json(DeleteResponse {
        message: format!("document {document_id} deleted"),
        removed_chunks,
    }))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let Some(store) = state.vector_store.as_ref() else {
        return Ok(Json(StatsResponse {
            available: false,
            stats: None,
        }));
    };

    let stats = store.stats().await.map_err(|e| {
        tracing::error!(error = %e, "stats unavailable");
        ApiError::from(e)
    })?;

    Ok(Json(StatsResponse {
        available: true,
        stats: Some(stats),
    }))
}

fn preview(text: &str) -> String {
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    if cut.len() < text.len() {
        format!("{cut}...")
    } else {
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_keeps_short_text_untouched() {
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_preview_cuts_long_text_with_marker() {
        let text = "d".repeat(700);
        let out = preview(&text);
        assert_eq!(out.chars().count(), PREVIEW_CHARS + 3);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let text = "ü".repeat(600);
        let out = preview(&text);
        assert!(out.starts_with('ü'));
        assert!(out.ends_with("..."));
    }
}
