use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::screening::pipeline::IngestError;
use crate::screening::ranking::RankingError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every response body is `{"error": message}`. Collaborator errors are
/// already scrubbed of endpoints and credentials, so their text is passed on.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    MissingInput(String),

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Ranking(#[from] RankingError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::MissingInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Multipart(e) => (e.status(), format!("Invalid upload: {}", e.body_text())),
            AppError::Ingest(e) => {
                tracing::error!(stage = %e.stage(), "Ingest failed: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Ranking(e) => {
                tracing::error!("Ranking failed: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
