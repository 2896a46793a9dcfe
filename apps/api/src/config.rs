use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_KEYWORDS: [&str; 6] = ["MongoDB", "Express", "React", "Node.js", "Python", "Java"];
pub const DEFAULT_MODEL_ID: &str = "resume-training";

/// Application configuration loaded from environment variables.
/// Start-up fails if required variables are missing.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub resume_table: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub document_url_ttl: Duration,
    pub analyzer_endpoint: String,
    pub analyzer_api_key: String,
    pub analyzer_model_id: String,
    pub match_keywords: Vec<String>,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let resume_table = optional_env("RESUME_TABLE", "resumes");
        if !is_valid_identifier(&resume_table) {
            bail!("RESUME_TABLE must be a plain SQL identifier, got '{resume_table}'");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            resume_table,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_region: optional_env("S3_REGION", "us-east-1"),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            document_url_ttl: Duration::from_secs(
                optional_env("DOCUMENT_URL_TTL_SECS", "3600")
                    .parse::<u64>()
                    .context("DOCUMENT_URL_TTL_SECS must be a number of seconds")?,
            ),
            analyzer_endpoint: require_env("ANALYZER_ENDPOINT")?,
            analyzer_api_key: require_env("ANALYZER_API_KEY")?,
            analyzer_model_id: optional_env("ANALYZER_MODEL_ID", DEFAULT_MODEL_ID),
            match_keywords: parse_keywords(std::env::var("MATCH_KEYWORDS").ok().as_deref())?,
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES", "10485760")
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("resume_table", &self.resume_table)
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("s3_region", &self.s3_region)
            .field("document_url_ttl", &self.document_url_ttl)
            .field("analyzer_endpoint", &self.analyzer_endpoint)
            .field("analyzer_model_id", &self.analyzer_model_id)
            .field("match_keywords", &self.match_keywords)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish_non_exhaustive()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parses a comma-separated keyword list. `None` yields the default set;
/// an explicitly empty list is rejected.
pub fn parse_keywords(raw: Option<&str>) -> Result<Vec<String>> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect());
    };
    let keywords: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect();
    if keywords.is_empty() {
        bail!("MATCH_KEYWORDS must contain at least one keyword");
    }
    Ok(keywords)
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
