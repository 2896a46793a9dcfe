/// Document Intelligence client: the single point of entry for calls to the
/// external document-analysis service.
///
/// Analysis is a long-running operation. The document is submitted once, then
/// the returned operation URL is polled until the service reports a result.
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{AnalyzerError, DocumentAnalyzer, ExtractedFields};

const API_VERSION: &str = "2023-07-31";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION: &str = "Operation-Location";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);
const MAX_POLLS: u32 = 120;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum OperationStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: OperationStatus,
    error: Option<ServiceErrorBody>,
    analyze_result: Option<AnalyzeResult>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    documents: Vec<AnalyzedDocument>,
}

#[derive(Debug, Deserialize)]
struct AnalyzedDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    error: ServiceErrorBody,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl ServiceErrorBody {
    fn describe(&self) -> String {
        match (self.code.is_empty(), self.message.is_empty()) {
            (false, false) => format!("{}: {}", self.code, self.message),
            (false, true) => self.code.clone(),
            (true, false) => self.message.clone(),
            (true, true) => "unspecified service error".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct DocumentIntelligenceClient {
    client: Client,
    endpoint: String,
    api_key: String,
    max_polls: u32,
}

impl DocumentIntelligenceClient {
    pub fn new(endpoint: &str, api_key: String) -> Result<Self, AnalyzerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            max_polls: MAX_POLLS,
        })
    }

    fn analyze_url(&self, model_id: &str) -> String {
        format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            self.endpoint, model_id, API_VERSION
        )
    }

    async fn submit(&self, document: Bytes, model_id: &str) -> Result<String, AnalyzerError> {
        let response = self
            .client
            .post(self.analyze_url(model_id))
            .header(KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(document)
            .send()
            .await?;

        let response = check_status(response).await?;
        response
            .headers()
            .get(OPERATION_LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or(AnalyzerError::MissingOperationLocation)
    }

    async fn poll(&self, operation_url: &str) -> Result<ExtractedFields, AnalyzerError> {
        let mut delay = DEFAULT_POLL_INTERVAL;

        for attempt in 1..=self.max_polls {
            tokio::time::sleep(delay).await;

            let response = self
                .client
                .get(operation_url)
                .header(KEY_HEADER, &self.api_key)
                .send()
                .await?;
            let response = check_status(response).await?;
            delay = retry_after(response.headers()).unwrap_or(DEFAULT_POLL_INTERVAL);

            let operation: AnalyzeOperation = serde_json::from_slice(&response.bytes().await?)?;
            match operation.status {
                OperationStatus::Succeeded => {
                    debug!("Analysis succeeded after {attempt} status checks");
                    return Ok(operation
                        .analyze_result
                        .map(fields_from_result)
                        .unwrap_or_default());
                }
                OperationStatus::Failed | OperationStatus::Canceled => {
                    let reason = operation
                        .error
                        .map(|e| e.describe())
                        .unwrap_or_else(|| "operation did not complete".to_string());
                    return Err(AnalyzerError::Failed(reason));
                }
                OperationStatus::NotStarted | OperationStatus::Running => {}
                OperationStatus::Unknown => {
                    warn!("Analysis reported an unrecognised status, still waiting");
                }
            }
        }

        Err(AnalyzerError::TimedOut {
            polls: self.max_polls,
        })
    }
}

#[async_trait]
impl DocumentAnalyzer for DocumentIntelligenceClient {
    async fn analyze(
        &self,
        document: Bytes,
        model_id: &str,
    ) -> Result<ExtractedFields, AnalyzerError> {
        debug!("Submitting {} bytes to model {model_id}", document.len());
        let operation_url = self.submit(document, model_id).await?;
        self.poll(&operation_url).await
    }
}

async fn check_status(response: Response) -> Result<Response, AnalyzerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ServiceError>(&body)
        .map(|e| e.error.describe())
        .unwrap_or(body);
    Err(AnalyzerError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Poll delay requested by the service, capped at [`MAX_POLL_INTERVAL`] so the
/// total wait stays bounded by the poll count.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs).min(MAX_POLL_INTERVAL))
}

/// Only the first analyzed document is used; a result without documents
/// yields no fields.
fn fields_from_result(result: AnalyzeResult) -> ExtractedFields {
    result
        .documents
        .into_iter()
        .next()
        .map(|doc| {
            doc.fields
                .iter()
                .map(|(name, field)| (name.clone(), field_value(field)))
                .collect()
        })
        .unwrap_or_default()
}

/// A field's typed value (`valueString` first, then any other scalar
/// `value*` property), falling back to the raw `content` text.
fn field_value(field: &Value) -> Option<String> {
    let field = field.as_object()?;
    if let Some(s) = field.get("valueString").and_then(Value::as_str) {
        return Some(s.to_string());
    }
    let typed = field
        .iter()
        .filter(|(key, _)| key.starts_with("value"))
        .find_map(|(_, value)| scalar_to_string(value));
    typed.or_else(|| field.get("content").and_then(Value::as_str).map(String::from))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
