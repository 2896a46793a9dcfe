//! In-memory collaborators for exercising the pipeline and routes offline.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::analyzer::{AnalyzerError, DocumentAnalyzer, ExtractedFields};
use crate::models::resume::ResumeRecord;
use crate::records::{RecordStoreError, ResumeRecordStore};
use crate::storage::{object_key, DocumentStore, DocumentStoreError};

#[derive(Default)]
pub struct MemoryDocumentStore {
    fail: bool,
    uploads: Mutex<Vec<(String, String)>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn content_types(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn upload(
        &self,
        name: &str,
        _bytes: Bytes,
        content_type: &str,
    ) -> Result<String, DocumentStoreError> {
        if self.fail {
            return Err(DocumentStoreError::Upload {
                name: name.to_string(),
                reason: "bucket unavailable".to_string(),
            });
        }
        self.uploads
            .lock()
            .unwrap()
            .push((name.to_string(), content_type.to_string()));
        Ok(format!(
            "memory://documents/{}?expires=3600",
            object_key(Uuid::new_v4(), name)
        ))
    }
}

pub struct FakeAnalyzer {
    result: Result<ExtractedFields, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeAnalyzer {
    pub fn returning(fields: ExtractedFields) -> Self {
        Self {
            result: Ok(fields),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Model ids the analyzer was called with.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentAnalyzer for FakeAnalyzer {
    async fn analyze(
        &self,
        _document: Bytes,
        model_id: &str,
    ) -> Result<ExtractedFields, AnalyzerError> {
        self.calls.lock().unwrap().push(model_id.to_string());
        self.result.clone().map_err(AnalyzerError::Failed)
    }
}

#[derive(Default)]
pub struct MemoryRecordStore {
    fail_inserts: bool,
    fail_listing: bool,
    rows: Mutex<Vec<ResumeRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ResumeRecord>) -> Self {
        Self {
            rows: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Self::default()
        }
    }

    pub fn failing_listing() -> Self {
        Self {
            fail_listing: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<ResumeRecord> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResumeRecordStore for MemoryRecordStore {
    async fn insert(&self, record: &ResumeRecord) -> Result<(), RecordStoreError> {
        if self.fail_inserts {
            return Err(RecordStoreError::Database("table is read-only".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r.id == record.id) {
            return Err(RecordStoreError::Duplicate(record.id));
        }
        rows.push(record.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ResumeRecord>, RecordStoreError> {
        if self.fail_listing {
            return Err(RecordStoreError::Database("table not found".to_string()));
        }
        Ok(self.records())
    }
}
