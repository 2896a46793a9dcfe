use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One screened resume. Rows are insert-only; nothing updates or deletes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ResumeRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub skills: String,
    pub experience: String,
    /// Always in 0..=100, computed by the match scorer.
    pub match_percentage: i32,
    /// Time-limited retrieval URL of the stored original document.
    pub document_url: String,
    pub created_at: DateTime<Utc>,
}

/// Display subset returned by the ranking endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResume {
    pub name: String,
    pub email: String,
    pub skills: String,
    pub experience: String,
    #[serde(rename = "match")]
    pub match_percentage: i32,
    pub url: String,
}

impl From<ResumeRecord> for RankedResume {
    fn from(record: ResumeRecord) -> Self {
        Self {
            name: record.name,
            email: record.email,
            skills: record.skills,
            experience: record.experience,
            match_percentage: record.match_percentage,
            url: record.document_url,
        }
    }
}
