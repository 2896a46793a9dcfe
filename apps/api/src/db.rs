use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::records::PgResumeRecordStore;

/// Connects to Postgres and prepares the resume table, creating it on first run.
pub async fn connect_record_store(database_url: &str, table: &str) -> Result<PgResumeRecordStore> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
        .context("could not connect to the record database")?;

    let store = PgResumeRecordStore::new(pool, table);
    store
        .ensure_table()
        .await
        .context("could not prepare the resume table")?;

    info!("Record store ready");
    Ok(store)
}
