use std::collections::BTreeMap;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::resume::RankedResume;
use crate::screening::pipeline::UploadedResume;
use crate::state::AppState;

/// Multipart field carrying the resume document.
pub const RESUME_FIELD: &str = "resume";
const UPLOAD_MESSAGE: &str = "File uploaded and analyzed successfully.";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub blob_url: String,
    pub extracted_data: BTreeMap<String, String>,
    pub match_percentage: i32,
}

/// POST /upload
///
/// A body that is not `multipart/form-data` carries no file part, so it is
/// answered like a form without the `resume` field.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let missing = || AppError::MissingInput("No file part in request".to_string());
    let mut multipart = multipart.map_err(|e| {
        debug!("Upload rejected before reading fields: {e}");
        missing()
    })?;
    let upload = read_resume(&mut multipart).await?.ok_or_else(missing)?;
    info!(
        "Received '{}' ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    );

    let outcome = state.pipeline.ingest(upload).await?;

    Ok(Json(UploadResponse {
        message: UPLOAD_MESSAGE,
        blob_url: outcome.record.document_url,
        extracted_data: outcome.extracted.display_view(),
        match_percentage: outcome.record.match_percentage,
    }))
}

/// GET /ranked-resumes
pub async fn handle_ranked_resumes(
    State(state): State<AppState>,
) -> Result<Json<Vec<RankedResume>>, AppError> {
    Ok(Json(state.ranking.ranked_resumes().await?))
}

/// Finds the `resume` field. A field with no file name and no content is what
/// browsers send when nothing was selected, so it counts as missing.
async fn read_resume(multipart: &mut Multipart) -> Result<Option<UploadedResume>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(String::from);
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(UploadedResume {
            file_name: if file_name.is_empty() {
                "resume".to_string()
            } else {
                file_name
            },
            content_type,
            bytes,
        }));
    }
    Ok(None)
}
