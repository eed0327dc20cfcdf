use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::debug;

use super::error::StorageError;
use super::path::{join_url, validate_object_path};
use super::traits::ObjectStore;
use crate::config::{RetryConfig, S3Config};
use crate::retry::{RetryPolicy, retry_with_backoff};

/// S3-compatible object store backed by `rust-s3`.
///
/// Writes that fail in transit or with a throttling or server-side status are
/// retried with bounded exponential backoff. Callers treat an error surfaced
/// from here as terminal.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_url: String,
    retry: RetryPolicy,
}

impl S3ObjectStore {
    pub fn new(config: &S3Config, retry: &RetryConfig) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Config(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(format!("invalid credentials: {e}")))?;

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;
        let bucket = if config.path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        let public_url = config.public_url.clone().unwrap_or_else(|| bucket.url());

        Ok(Self {
            bucket,
            public_url,
            retry: RetryPolicy::from(retry),
        })
    }
}

fn check_status(path: &str, status: u16) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        status => Err(StorageError::Status {
            path: path.to_string(),
            status,
        }),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_object_path(path)?;

        retry_with_backoff(
            self.retry,
            "put_object",
            || async move {
                let response = self
                    .bucket
                    .put_object_with_content_type(path, data, content_type)
                    .await
                    .map_err(|e| StorageError::Backend(e.to_string()))?;
                check_status(path, response.status_code())
            },
            StorageError::is_transient,
        )
        .await?;

        debug!(path, size = data.len(), "Object stored");
        Ok(self.object_url(path))
    }

    fn object_url(&self, path: &str) -> String {
        join_url(&self.public_url, path)
    }
}
