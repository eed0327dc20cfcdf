use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::StorageAppConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec![],
            max_age: 86400,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Maximum accepted request body. Default: 50 MiB.
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

fn default_body_limit_bytes() -> usize {
    50 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Component submission ingestion settings.
#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Suffix marking a multipart field as a category file field. Default: "_files".
    #[serde(default = "default_file_field_suffix")]
    pub file_field_suffix: String,
    /// Maximum number of file parts per submission. Default: 20.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Maximum size of a single file part. Default: 50 MiB.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// File parts larger than this are spooled to a temp file. Default: 1 MiB.
    #[serde(default = "default_inline_threshold")]
    pub inline_threshold: usize,
    /// Concurrent object uploads per submission. Default: 8.
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
}

fn default_file_field_suffix() -> String {
    "_files".into()
}
fn default_max_files() -> usize {
    20
}
fn default_max_file_size() -> u64 {
    50 * 1024 * 1024
}
fn default_inline_threshold() -> usize {
    1024 * 1024
}
fn default_upload_concurrency() -> usize {
    8
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            file_field_suffix: default_file_field_suffix(),
            max_files: default_max_files(),
            max_file_size: default_max_file_size(),
            inline_threshold: default_inline_threshold(),
            upload_concurrency: default_upload_concurrency(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageAppConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("EVIDENCE_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("storage.backend", "filesystem")?
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., EVIDENCE__DATABASE__URL)
            .add_source(Environment::with_prefix("EVIDENCE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
