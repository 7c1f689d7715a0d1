//! Boundary error type.
//!
//! Every handler returns `Result<T, ApiError>`. The response body is always
//! `{"detail": "..."}`; the status code comes from [`ApiError::status_code`].

use crate::extract::ExtractionError;
use crate::llm::CompletionError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pdfchat_shared::ErrorResponse;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller sent something we cannot act on.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Extraction(ExtractionError::Worker(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Completion(e) => match e {
                CompletionError::EmptyTranscript => StatusCode::BAD_REQUEST,
                CompletionError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
                CompletionError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                CompletionError::Network(_) | CompletionError::InvalidBody(_) => {
                    StatusCode::BAD_GATEWAY
                }
                CompletionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
