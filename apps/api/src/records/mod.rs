//! Resume record persistence: append-only inserts and a full listing.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::models::resume::ResumeRecord;

/// All records share one logical grouping.
pub const PARTITION_KEY: &str = "Resume";

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("record {0} already exists")]
    Duplicate(uuid::Uuid),
}

impl From<sqlx::Error> for RecordStoreError {
    fn from(err: sqlx::Error) -> Self {
        // Connection-level errors can echo connection options; only the
        // server's own message or the error kind is kept.
        let message = match &err {
            sqlx::Error::Database(db) => db.message().to_string(),
            sqlx::Error::PoolTimedOut => "timed out waiting for a connection".to_string(),
            sqlx::Error::PoolClosed => "connection pool is closed".to_string(),
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) => "database is unreachable".to_string(),
            sqlx::Error::RowNotFound => "row not found".to_string(),
            sqlx::Error::ColumnNotFound(col) => format!("column '{col}' not found"),
            sqlx::Error::ColumnDecode { index, .. } => format!("could not decode column {index}"),
            _ => "database request failed".to_string(),
        };
        RecordStoreError::Database(message)
    }
}

/// Structured store holding one record per ingested resume.
#[async_trait]
pub trait ResumeRecordStore: Send + Sync {
    async fn insert(&self, record: &ResumeRecord) -> Result<(), RecordStoreError>;

    /// Every stored record, in insertion order.
    async fn list_all(&self) -> Result<Vec<ResumeRecord>, RecordStoreError>;
}

pub struct PgResumeRecordStore {
    pool: PgPool,
    table: String,
}

impl PgResumeRecordStore {
    /// `table` must already be a validated SQL identifier.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Creates the record table if it does not exist yet.
    pub async fn ensure_table(&self) -> Result<(), RecordStoreError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                seq              BIGSERIAL   PRIMARY KEY,
                id               UUID        NOT NULL UNIQUE,
                partition_key    TEXT        NOT NULL,
                name             TEXT        NOT NULL,
                email            TEXT        NOT NULL,
                skills           TEXT        NOT NULL,
                experience       TEXT        NOT NULL,
                match_percentage INTEGER     NOT NULL CHECK (match_percentage BETWEEN 0 AND 100),
                document_url     TEXT        NOT NULL,
                created_at       TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
            self.table
        ))
        .execute(&self.pool)
        .await?;

        info!("Record table '{}' ready", self.table);
        Ok(())
    }
}

#[async_trait]
impl ResumeRecordStore for PgResumeRecordStore {
    async fn insert(&self, record: &ResumeRecord) -> Result<(), RecordStoreError> {
        // Append-only: INSERT, never UPDATE
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {}
                (id, partition_key, name, email, skills, experience,
                 match_percentage, document_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
            self.table
        ))
        .bind(record.id)
        .bind(PARTITION_KEY)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.skills)
        .bind(&record.experience)
        .bind(record.match_percentage)
        .bind(&record.document_url)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RecordStoreError::Duplicate(record.id));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ResumeRecord>, RecordStoreError> {
        Ok(sqlx::query_as::<_, ResumeRecord>(&format!(
            r#"
            SELECT id, name, email, skills, experience, match_percentage, document_url, created_at
            FROM {}
            WHERE partition_key = $1
            ORDER BY seq ASC
            "#,
            self.table
        ))
        .bind(PARTITION_KEY)
        .fetch_all(&self.pool)
        .await?)
    }
}
