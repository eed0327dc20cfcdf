use std::path::PathBuf;

use serde::Deserialize;

/// Which object store implementation backs uploads.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    #[default]
    Filesystem,
}

/// S3-compatible bucket settings.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    /// AWS region name, or the signing region for a custom endpoint. Default: "us-east-1".
    #[serde(default = "default_s3_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, Azurite gateways, ...).
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Use path-style addressing. Default: false.
    #[serde(default)]
    pub path_style: bool,
    /// Base URL returned for stored objects. Defaults to the bucket URL.
    #[serde(default)]
    pub public_url: Option<String>,
}

fn default_s3_region() -> String {
    "us-east-1".into()
}

/// Local filesystem store settings.
#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemConfig {
    /// Root directory for objects. Default: "./data/objects".
    #[serde(default = "default_fs_root")]
    pub root: PathBuf,
    /// Base URL returned for stored objects. Default: "file://data/objects".
    #[serde(default = "default_fs_public_url")]
    pub public_url: String,
}

fn default_fs_root() -> PathBuf {
    PathBuf::from("./data/objects")
}
fn default_fs_public_url() -> String {
    "file://data/objects".into()
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            root: default_fs_root(),
            public_url: default_fs_public_url(),
        }
    }
}

/// Bounded retry applied at the object store boundary.
#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// Total attempts per object write. Default: 3.
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u8,
    /// Base delay for exponential backoff. Default: 200ms.
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound on a single backoff delay. Default: 5000ms.
    #[serde(default = "default_retry_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_retry_max_attempts() -> u8 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    200
}
fn default_retry_max_delay_ms() -> u64 {
    5000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            base_delay_ms: default_retry_base_delay_ms(),
            max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

/// App-level object storage configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageAppConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Required when `backend = "s3"`.
    #[serde(default)]
    pub s3: Option<S3Config>,
    #[serde(default)]
    pub filesystem: FilesystemConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}
