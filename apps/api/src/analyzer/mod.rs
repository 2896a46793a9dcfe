//! Document analysis. Field extraction is delegated to an external
//! document-understanding service running a trained resume model.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod client;

pub const NAME_FIELD: &str = "Name";
pub const EMAIL_FIELD: &str = "Email";
pub const SKILLS_FIELD: &str = "Skills";
pub const EXPERIENCE_FIELD: &str = "Experience";

/// Fields every resume extraction is expected to produce.
pub const EXPECTED_FIELDS: [&str; 4] = [NAME_FIELD, EMAIL_FIELD, SKILLS_FIELD, EXPERIENCE_FIELD];

/// Placeholder shown in the extraction view for a field without a value.
pub const NOT_FOUND: &str = "Not found";

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("analysis service did not return an operation location")]
    MissingOperationLocation,

    #[error("analysis failed: {0}")]
    Failed(String),

    #[error("analysis did not finish after {polls} status checks")]
    TimedOut { polls: u32 },
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs embed the service endpoint; keep them out of messages.
        AnalyzerError::Http(err.without_url().to_string())
    }
}

/// Opaque document-understanding service.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Runs `model_id` over the document and returns the extracted fields.
    /// Blocks until the service reports completion or failure.
    async fn analyze(&self, document: Bytes, model_id: &str)
        -> Result<ExtractedFields, AnalyzerError>;
}

/// Named fields extracted from one document. A field may be present without a
/// value when the model located it but could not read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    fields: BTreeMap<String, Option<String>>,
}

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        self.fields.insert(name.into(), value);
    }

    /// The extracted value, or `None` when the field is absent, null or empty.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Extraction output as shown to the uploader: every returned field plus
    /// the expected ones, with [`NOT_FOUND`] standing in for missing values.
    pub fn display_view(&self) -> BTreeMap<String, String> {
        let names = self
            .fields
            .keys()
            .map(String::as_str)
            .chain(EXPECTED_FIELDS);
        names
            .map(|name| {
                let value = self.value(name).unwrap_or(NOT_FOUND);
                (name.to_string(), value.to_string())
            })
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for ExtractedFields {
    fn from_iter<T: IntoIterator<Item = (K, Option<String>)>>(iter: T) -> Self {
        let mut fields = ExtractedFields::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}
