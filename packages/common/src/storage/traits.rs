use async_trait::async_trait;

use super::error::StorageError;

/// Path-addressed object storage.
///
/// Paths are opaque `/`-separated keys. There are no real directories: a
/// "folder" exists only as a prefix shared by the objects beneath it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes at `path` and return the public URL of the object.
    async fn put_object(
        &self,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// The URL an object at `path` is (or would be) reachable under.
    fn object_url(&self, path: &str) -> String;
}
