use std::sync::Arc;

use crate::screening::pipeline::IngestPipeline;
use crate::screening::ranking::RankingQuery;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    pub ranking: Arc<RankingQuery>,
    /// Request body cap for uploads, in bytes.
    pub max_upload_bytes: usize,
}
