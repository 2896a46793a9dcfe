use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::models::resume::{RankedResume, ResumeRecord};
use crate::records::{RecordStoreError, ResumeRecordStore};

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Query error: {0}")]
    Query(#[from] RecordStoreError),
}

/// Lists every stored resume, best match first.
///
/// This is a full scan of the record store; fine while volumes stay small.
pub struct RankingQuery {
    records: Arc<dyn ResumeRecordStore>,
}

impl RankingQuery {
    pub fn new(records: Arc<dyn ResumeRecordStore>) -> Self {
        Self { records }
    }

    pub async fn ranked_resumes(&self) -> Result<Vec<RankedResume>, RankingError> {
        let records = self.records.list_all().await?;
        debug!("Ranking {} resumes", records.len());
        Ok(rank(records).into_iter().map(RankedResume::from).collect())
    }
}

/// Sorts by match percentage, descending. The sort is stable, so equal scores
/// keep the store's insertion order.
pub fn rank(mut records: Vec<ResumeRecord>) -> Vec<ResumeRecord> {
    records.sort_by(|a, b| b.match_percentage.cmp(&a.match_percentage));
    records
}
