//! Document storage. Uploaded resumes are kept as objects and handed back as
//! presigned, read-only retrieval URLs that expire after a configured TTL.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("upload of '{name}' failed: {reason}")]
    Upload { name: String, reason: String },

    #[error("could not create retrieval URL for '{name}': {reason}")]
    Presign { name: String, reason: String },

    #[error("invalid retrieval URL lifetime: {0}")]
    UrlLifetime(String),
}

/// Opaque blob storage for uploaded documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores `bytes` under `name` and returns a time-limited retrieval URL.
    async fn upload(
        &self,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, DocumentStoreError>;
}

/// S3-compatible store (MinIO locally, AWS in production).
pub struct S3DocumentStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    url_ttl: Duration,
}

impl S3DocumentStore {
    /// Fails when `url_ttl` cannot be presigned, so a bad lifetime is caught at
    /// start-up rather than after each upload has already been written.
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: impl Into<String>,
        url_ttl: Duration,
    ) -> Result<Self, DocumentStoreError> {
        presigning_config(url_ttl)?;
        Ok(Self {
            client,
            bucket: bucket.into(),
            url_ttl,
        })
    }
}

/// Presigned URLs must live at least one second and at most one week.
pub fn presigning_config(url_ttl: Duration) -> Result<PresigningConfig, DocumentStoreError> {
    if url_ttl.as_secs() == 0 {
        return Err(DocumentStoreError::UrlLifetime(
            "must be at least one second".to_string(),
        ));
    }
    PresigningConfig::expires_in(url_ttl)
        .map_err(|e| DocumentStoreError::UrlLifetime(e.to_string()))
}

#[async_trait]
impl DocumentStore for S3DocumentStore {
    async fn upload(
        &self,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, DocumentStoreError> {
        let presigning = presigning_config(self.url_ttl)?;
        let key = object_key(Uuid::new_v4(), name);
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| DocumentStoreError::Upload {
                name: name.to_string(),
                reason: describe_sdk_error(&e),
            })?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(presigning)
            .await
            .map_err(|e| DocumentStoreError::Presign {
                name: name.to_string(),
                reason: describe_sdk_error(&e),
            })?;

        debug!(
            "Presigned read URL for {key} valid for {}s",
            self.url_ttl.as_secs()
        );
        Ok(presigned.uri().to_string())
    }
}

/// Objects are keyed per upload so equal file names never overwrite each other.
pub fn object_key(upload_id: Uuid, name: &str) -> String {
    format!("resumes/{upload_id}/{}", sanitize_file_name(name))
}

/// Reduces a client-supplied file name to a safe object name: directory parts
/// are dropped and anything outside `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned.to_string()
    }
}

// SDK errors are reduced to the service's code and message; request details
// (endpoint, signed headers) never reach the caller.
fn describe_sdk_error<E, R>(err: &SdkError<E, R>) -> String
where
    E: ProvideErrorMetadata,
{
    match err {
        SdkError::ServiceError(service) => {
            let inner = service.err();
            format!(
                "{}: {}",
                inner.code().unwrap_or("Unknown"),
                inner.message().unwrap_or("no message")
            )
        }
        SdkError::TimeoutError(_) => "request to object store timed out".to_string(),
        SdkError::DispatchFailure(_) => "object store is unreachable".to_string(),
        _ => "object store request failed".to_string(),
    }
}
