//! Upload → analyze → score → persist, for one uploaded resume.
//!
//! Stages run strictly in order and each runs at most once. The first failing
//! stage aborts the rest, so a record is only stored when every earlier stage
//! succeeded.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analyzer::{
    AnalyzerError, DocumentAnalyzer, ExtractedFields, EMAIL_FIELD, EXPERIENCE_FIELD, NAME_FIELD,
    SKILLS_FIELD,
};
use crate::models::resume::ResumeRecord;
use crate::records::{RecordStoreError, ResumeRecordStore};
use crate::screening::scoring::MatchScorer;
use crate::storage::{DocumentStore, DocumentStoreError};

pub const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

// Record-level defaults, distinct from the extraction view's "Not found".
const UNKNOWN_NAME: &str = "Unknown";
const MISSING_TEXT: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Store,
    Analyze,
    Persist,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IngestStage::Store => "store",
            IngestStage::Analyze => "analyze",
            IngestStage::Persist => "persist",
        })
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Storage error: {0}")]
    Storage(#[source] DocumentStoreError),

    #[error("Analysis error: {0}")]
    Analysis(#[source] AnalyzerError),

    #[error("Persistence error: {0}")]
    Persistence(#[source] RecordStoreError),
}

impl IngestError {
    pub fn stage(&self) -> IngestStage {
        match self {
            IngestError::Storage(_) => IngestStage::Store,
            IngestError::Analysis(_) => IngestStage::Analyze,
            IngestError::Persistence(_) => IngestStage::Persist,
        }
    }
}

/// A resume document as received from the uploader.
#[derive(Debug, Clone)]
pub struct UploadedResume {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// The stored record together with the raw extraction it was built from.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub record: ResumeRecord,
    pub extracted: ExtractedFields,
}

/// Collaborator handles are built once at start-up and shared across requests.
pub struct IngestPipeline {
    documents: Arc<dyn DocumentStore>,
    analyzer: Arc<dyn DocumentAnalyzer>,
    records: Arc<dyn ResumeRecordStore>,
    scorer: MatchScorer,
    model_id: String,
}

impl IngestPipeline {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        analyzer: Arc<dyn DocumentAnalyzer>,
        records: Arc<dyn ResumeRecordStore>,
        scorer: MatchScorer,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            analyzer,
            records,
            scorer,
            model_id: model_id.into(),
        }
    }

    pub async fn ingest(&self, upload: UploadedResume) -> Result<IngestOutcome, IngestError> {
        let UploadedResume {
            file_name,
            content_type,
            bytes,
        } = upload;
        let content_type = content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);

        // 1. Store the original document
        let document_url = self
            .documents
            .upload(&file_name, bytes.clone(), content_type)
            .await
            .map_err(IngestError::Storage)?;
        debug!("Stored '{file_name}'");

        // 2. Extract fields with the trained model
        let extracted = self
            .analyzer
            .analyze(bytes, &self.model_id)
            .await
            .map_err(IngestError::Analysis)?;
        if extracted.is_empty() {
            warn!("Model {} found no fields in '{file_name}'", self.model_id);
        }

        // 3. Score skills against the keyword set
        let skills = extracted.value(SKILLS_FIELD);
        let match_percentage = self.scorer.score(skills);

        // 4. Persist
        let record = build_record(&extracted, match_percentage, document_url);
        self.records
            .insert(&record)
            .await
            .map_err(IngestError::Persistence)?;

        info!(
            "Ingested '{file_name}' as record {} ({}% match)",
            record.id, record.match_percentage
        );

        Ok(IngestOutcome { record, extracted })
    }
}

fn build_record(
    extracted: &ExtractedFields,
    match_percentage: u32,
    document_url: String,
) -> ResumeRecord {
    let text = |field: &str, default: &str| extracted.value(field).unwrap_or(default).to_string();
    ResumeRecord {
        id: Uuid::new_v4(),
        name: text(NAME_FIELD, UNKNOWN_NAME),
        email: text(EMAIL_FIELD, MISSING_TEXT),
        skills: text(SKILLS_FIELD, ""),
        experience: text(EXPERIENCE_FIELD, MISSING_TEXT),
        match_percentage: match_percentage.min(100) as i32,
        document_url,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::NOT_FOUND;
    use crate::config::DEFAULT_KEYWORDS;
    use crate::screening::testing::{FakeAnalyzer, MemoryDocumentStore, MemoryRecordStore};

    struct Harness {
        documents: Arc<MemoryDocumentStore>,
        analyzer: Arc<FakeAnalyzer>,
        records: Arc<MemoryRecordStore>,
        pipeline: IngestPipeline,
    }

    fn harness(documents: MemoryDocumentStore, analyzer: FakeAnalyzer) -> Harness {
        let documents = Arc::new(documents);
        let analyzer = Arc::new(analyzer);
        let records = Arc::new(MemoryRecordStore::new());
        let pipeline = IngestPipeline::new(
            documents.clone(),
            analyzer.clone(),
            records.clone(),
            MatchScorer::new(DEFAULT_KEYWORDS).unwrap(),
            "resume-training",
        );
        Harness {
            documents,
            analyzer,
            records,
            pipeline,
        }
    }

    fn upload(name: &str) -> UploadedResume {
        UploadedResume {
            file_name: name.to_string(),
            content_type: None,
            bytes: Bytes::from_static(b"%PDF-1.7 resume"),
        }
    }

    fn full_fields(skills: &str) -> ExtractedFields {
        [
            ("Name", Some("Jane Doe".to_string())),
            ("Email", Some("jane@example.com".to_string())),
            ("Skills", Some(skills.to_string())),
            ("Experience", Some("4 years backend".to_string())),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_ingest_scores_and_persists() {
        let h = harness(
            MemoryDocumentStore::new(),
            FakeAnalyzer::returning(full_fields("Python, React")),
        );

        let outcome = h.pipeline.ingest(upload("jane.pdf")).await.unwrap();

        assert_eq!(outcome.record.match_percentage, 33);
        assert_eq!(outcome.record.name, "Jane Doe");
        assert_eq!(outcome.record.skills, "Python, React");
        assert!(outcome.record.document_url.contains("jane.pdf"));
        assert_eq!(h.records.records(), vec![outcome.record.clone()]);
        assert_eq!(h.documents.uploads(), vec!["jane.pdf".to_string()]);
        assert_eq!(h.analyzer.calls(), vec!["resume-training".to_string()]);
    }

    #[tokio::test]
    async fn test_default_content_type_is_pdf() {
        let h = harness(
            MemoryDocumentStore::new(),
            FakeAnalyzer::returning(full_fields("Java")),
        );
        h.pipeline.ingest(upload("cv.pdf")).await.unwrap();

        let mut docx = upload("cv.docx");
        docx.content_type = Some("application/msword".to_string());
        h.pipeline.ingest(docx).await.unwrap();

        assert_eq!(
            h.documents.content_types(),
            vec!["application/pdf".to_string(), "application/msword".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_fields_use_record_defaults() {
        let fields: ExtractedFields = [("Email", None::<String>)].into_iter().collect();
        let h = harness(MemoryDocumentStore::new(), FakeAnalyzer::returning(fields));

        let outcome = h.pipeline.ingest(upload("blank.pdf")).await.unwrap();
        let record = &outcome.record;

        assert_eq!(record.match_percentage, 0);
        assert_eq!(record.name, "Unknown");
        assert_eq!(record.email, "N/A");
        assert_eq!(record.skills, "");
        assert_eq!(record.experience, "N/A");
        assert_eq!(h.records.records().len(), 1);

        // The extraction view keeps its own placeholder.
        let view = outcome.extracted.display_view();
        assert_eq!(view["Skills"], NOT_FOUND);
        assert_eq!(view["Email"], NOT_FOUND);
    }

    #[tokio::test]
    async fn test_storage_failure_skips_analysis() {
        let h = harness(
            MemoryDocumentStore::failing(),
            FakeAnalyzer::returning(full_fields("Python")),
        );

        let err = h.pipeline.ingest(upload("jane.pdf")).await.unwrap_err();

        assert_eq!(err.stage(), IngestStage::Store);
        assert!(err.to_string().starts_with("Storage error"));
        assert!(h.analyzer.calls().is_empty());
        assert!(h.records.records().is_empty());
    }

    #[tokio::test]
    async fn test_analysis_failure_stores_no_record() {
        let h = harness(MemoryDocumentStore::new(), FakeAnalyzer::failing("corrupt document"));

        let err = h.pipeline.ingest(upload("broken.pdf")).await.unwrap_err();

        assert_eq!(err.stage(), IngestStage::Analyze);
        assert!(err.to_string().contains("corrupt document"));
        assert!(h.records.records().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_is_classified() {
        let documents = Arc::new(MemoryDocumentStore::new());
        let records = Arc::new(MemoryRecordStore::failing_inserts());
        let pipeline = IngestPipeline::new(
            documents,
            Arc::new(FakeAnalyzer::returning(full_fields("React"))),
            records.clone(),
            MatchScorer::new(DEFAULT_KEYWORDS).unwrap(),
            "resume-training",
        );

        let err = pipeline.ingest(upload("jane.pdf")).await.unwrap_err();

        assert_eq!(err.stage(), IngestStage::Persist);
        assert!(records.records().is_empty());
    }

    #[tokio::test]
    async fn test_same_file_name_creates_distinct_records() {
        let h = harness(
            MemoryDocumentStore::new(),
            FakeAnalyzer::returning(full_fields("Python")),
        );

        let first = h.pipeline.ingest(upload("cv.pdf")).await.unwrap();
        let second = h.pipeline.ingest(upload("cv.pdf")).await.unwrap();

        assert_ne!(first.record.id, second.record.id);
        assert_ne!(first.record.document_url, second.record.document_url);
        let stored = h.records.records();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0], first.record);
    }

    #[test]
    fn test_build_record_clamps_percentage() {
        let record = build_record(&ExtractedFields::new(), 250, "u".to_string());
        assert_eq!(record.match_percentage, 100);
    }
}
