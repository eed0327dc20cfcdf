use common::storage::ObjectStore;
use tracing::{instrument, warn};

use super::category::Category;
use super::layout::ObjectPrefix;

pub const PLACEHOLDER_NAME: &str = ".keep";
pub const PLACEHOLDER_CONTENT: &[u8] = b"Folder placeholder";
const PLACEHOLDER_CONTENT_TYPE: &str = "text/plain";

/// Which category folders got a placeholder object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderReport {
    pub created: Vec<Category>,
    pub failed: Vec<(Category, String)>,
}

/// Write a placeholder object into every category folder under `prefix`.
///
/// Best effort: failures are logged and reported, never propagated. Writing
/// the same placeholder twice overwrites it with identical content.
#[instrument(skip_all, fields(stage = "folders", prefix = %prefix.as_str()))]
pub async fn initialize_folders(
    store: &dyn ObjectStore,
    prefix: &ObjectPrefix,
    categories: impl IntoIterator<Item = Category>,
) -> FolderReport {
    let writes = categories.into_iter().map(|category| async move {
        let path = prefix.object_path(category, PLACEHOLDER_NAME);
        let result = store
            .put_object(&path, PLACEHOLDER_CONTENT, PLACEHOLDER_CONTENT_TYPE)
            .await;
        (category, path, result)
    });

    let mut report = FolderReport::default();
    for (category, path, result) in futures::future::join_all(writes).await {
        match result {
            Ok(_) => report.created.push(category),
            Err(e) => {
                warn!(%path, error = %e, "Failed to initialize category folder");
                report.failed.push((category, e.to_string()));
            }
        }
    }
    report
}
