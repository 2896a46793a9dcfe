mod analyzer;
mod config;
mod db;
mod errors;
mod models;
mod records;
mod routes;
mod screening;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analyzer::client::DocumentIntelligenceClient;
use crate::config::Config;
use crate::db::connect_record_store;
use crate::routes::build_router;
use crate::screening::pipeline::IngestPipeline;
use crate::screening::ranking::RankingQuery;
use crate::screening::scoring::MatchScorer;
use crate::state::AppState;
use crate::storage::S3DocumentStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume screener v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {config:?}");

    // Collaborators are built once and shared by every request.
    let records = Arc::new(connect_record_store(&config.database_url, &config.resume_table).await?);

    let s3 = build_s3_client(&config).await;
    let documents = Arc::new(S3DocumentStore::new(
        s3,
        config.s3_bucket.clone(),
        config.document_url_ttl,
    )?);
    info!("Document store initialized (bucket: {})", config.s3_bucket);

    let analyzer = Arc::new(DocumentIntelligenceClient::new(
        &config.analyzer_endpoint,
        config.analyzer_api_key.clone(),
    )?);
    info!(
        "Document analyzer initialized (model: {})",
        config.analyzer_model_id
    );

    let scorer = MatchScorer::new(config.match_keywords.clone())?;
    info!("Match keywords: {}", scorer.keywords().join(", "));

    let state = AppState {
        pipeline: Arc::new(IngestPipeline::new(
            documents,
            analyzer,
            records.clone(),
            scorer,
            config.analyzer_model_id.clone(),
        )),
        ranking: Arc::new(RankingQuery::new(records)),
        max_upload_bytes: config.max_upload_bytes,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resume-screener-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path rather than by subdomain.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received");
}
