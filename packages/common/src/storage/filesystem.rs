use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::path::{join_url, validate_object_path};
use super::traits::ObjectStore;

const TEMP_DIR: &str = ".tmp";

/// Filesystem-backed object store.
///
/// Objects are stored at `{root}/{path}`, so the hierarchy of keys is mirrored
/// as real directories. Writes go through `{root}/.tmp` and are renamed into
/// place.
pub struct FilesystemObjectStore {
    root: PathBuf,
    public_url: String,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store.
    pub async fn new(root: PathBuf, public_url: impl Into<String>) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(TEMP_DIR)).await?;
        Ok(Self {
            root,
            public_url: public_url.into(),
        })
    }

    fn object_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        validate_object_path(path)?;
        if path.split('/').next() == Some(TEMP_DIR) {
            return Err(StorageError::InvalidPath(format!(
                "'{TEMP_DIR}' is reserved"
            )));
        }
        Ok(self.root.join(path))
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(TEMP_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put_object(
        &self,
        path: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let target = self.object_path(path)?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(self.object_url(path))
    }

    fn object_url(&self, path: &str) -> String {
        join_url(&self.public_url, path)
    }
}
