use crate::error::ApiError;
use crate::extract::extract_text_blocking;
use crate::llm::{summary_transcript, LlmService};
use axum::{
    body::Bytes,
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use pdfchat_shared::{ChatMessage, UploadResponse};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const FILE_FIELD: &str = "file";

#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_upload_bytes: usize,
    pub max_prompt_chars: usize,
}

pub fn router(llm_service: Arc<LlmService>, limits: Limits) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/upload-pdf/",
            post({
                let llm = llm_service.clone();
                move |multipart| upload_pdf(multipart, llm, limits.max_prompt_chars)
            })
            .layer(DefaultBodyLimit::max(limits.max_upload_bytes)),
        )
        .route(
            "/chat-completion/",
            post({
                let llm = llm_service.clone();
                move |body| chat_completion(body, llm)
            }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> &'static str {
    "OK"
}

async fn upload_pdf(
    multipart: Result<Multipart, MultipartRejection>,
    llm_service: Arc<LlmService>,
    max_prompt_chars: usize,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;
    let pdf_bytes = read_file_field(&mut multipart).await?;
    info!(bytes = pdf_bytes.len(), "Received PDF upload");

    let pdf_text = extract_text_blocking(pdf_bytes).await?;
    let prompt_text = truncate_chars(&pdf_text, max_prompt_chars);
    if prompt_text.len() < pdf_text.len() {
        warn!(
            extracted_chars = pdf_text.chars().count(),
            max_prompt_chars, "Extracted text truncated for the summary prompt"
        );
    }

    let groq_response = llm_service.complete(&summary_transcript(prompt_text)).await?;
    Ok(Json(UploadResponse {
        pdf_text,
        groq_response,
    }))
}

async fn chat_completion(
    body: Result<Json<Vec<ChatMessage>>, JsonRejection>,
    llm_service: Arc<LlmService>,
) -> Result<Json<Value>, ApiError> {
    let Json(messages) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    if messages.is_empty() {
        return Err(ApiError::validation("messages must not be empty"));
    }

    let response = llm_service.complete(&messages).await?;
    Ok(Json(response))
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(FILE_FIELD) {
            return field.bytes().await.map_err(multipart_error);
        }
    }
    Err(ApiError::validation(format!(
        "missing multipart field `{FILE_FIELD}`"
    )))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::validation(err.body_text())
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
