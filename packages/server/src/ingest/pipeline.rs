//! Request orchestration.
//!
//! `Received → Classified → Validated → {Uploaded, FoldersInitialized} →
//! Persisted → Reconciled → Responded`, with `ValidationFailed` before any
//! write and `PersistenceFailed` after objects were already stored.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use common::storage::ObjectStore;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::category::CategorySchema;
use super::classifier::{Classified, classify};
use super::extract::RawSubmission;
use super::folders::{FolderReport, PLACEHOLDER_NAME, initialize_folders};
use super::layout::ObjectPrefix;
use super::model::{NewComponent, UploadOutcome};
use super::persistence::{ValidationError, build_component, resolve_period};
use super::reconcile::{evidence_rows, reconcile};
use super::response::{IngestReport, file_counts};
use super::uploader::upload_files;
use crate::repository::ComponentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Classified,
    Validated,
    Uploaded,
    FoldersInitialized,
    Persisted,
    Reconciled,
    Responded,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Classified => "classified",
            Stage::Validated => "validated",
            Stage::Uploaded => "uploaded",
            Stage::FoldersInitialized => "folders_initialized",
            Stage::Persisted => "persisted",
            Stage::Reconciled => "reconciled",
            Stage::Responded => "responded",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failures of a submission.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Rejected before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The component insert failed. `orphaned` lists objects already stored
    /// that no row references.
    #[error("failed to insert component ({} orphaned objects): {source}", .orphaned.len())]
    Persistence {
        #[source]
        source: DbErr,
        orphaned: Vec<String>,
    },
}

/// Runs a raw submission through every stage against the configured stores.
pub struct IngestPipeline {
    schema: Arc<CategorySchema>,
    objects: Arc<dyn ObjectStore>,
    records: Arc<dyn ComponentStore>,
    upload_concurrency: usize,
}

impl IngestPipeline {
    pub fn new(
        schema: Arc<CategorySchema>,
        objects: Arc<dyn ObjectStore>,
        records: Arc<dyn ComponentStore>,
        upload_concurrency: usize,
    ) -> Self {
        Self {
            schema,
            objects,
            records,
            upload_concurrency,
        }
    }

    #[instrument(skip_all, fields(fields = raw.fields.len()))]
    pub async fn run(&self, raw: RawSubmission) -> Result<IngestReport, IngestError> {
        info!(stage = %Stage::Received, "Processing component submission");

        let Classified {
            submission,
            errors: dropped,
        } = classify(raw, &self.schema).await;
        info!(
            stage = %Stage::Classified,
            files = submission.file_count(),
            dropped = dropped.len(),
            "Submission classified"
        );

        let now = Utc::now();
        let component = build_component(&submission, now).inspect_err(|e| {
            info!(stage = "validation_failed", error = %e, "Submission rejected");
        })?;
        info!(stage = %Stage::Validated, cm_code = %component.cm_code, "Required fields present");

        let period = resolve_period(self.records.as_ref(), component.year).await;
        let component = NewComponent {
            periods: period.name.clone(),
            ..component
        };
        let prefix = ObjectPrefix::new(
            &period.path_segment,
            &component.cm_code,
            &component.sku_code,
            &component.component_code,
        );

        let (mut uploads, folders) = tokio::join!(
            upload_files(
                self.objects.as_ref(),
                &prefix,
                &submission,
                self.upload_concurrency
            ),
            initialize_folders(self.objects.as_ref(), &prefix, self.schema.categories()),
        );
        info!(
            stage = %Stage::Uploaded,
            uploaded = uploads.success_count(),
            failed = uploads.errors.len(),
            "Uploads finished"
        );
        info!(
            stage = %Stage::FoldersInitialized,
            created = folders.created.len(),
            failed = folders.failed.len(),
            "Category folders initialized"
        );

        // Classifier drops come first, in arrival order.
        let mut errors = dropped;
        errors.append(&mut uploads.errors);
        uploads.errors = errors;

        let record = match self.records.insert_component(component).await {
            Ok(record) => record,
            Err(source) => {
                let orphaned = stored_paths(&uploads, &folders, &prefix);
                warn!(
                    stage = "persistence_failed",
                    error = %source,
                    orphaned = ?orphaned,
                    "Component insert failed, stored objects are now orphaned"
                );
                return Err(IngestError::Persistence { source, orphaned });
            }
        };
        info!(stage = %Stage::Persisted, component_id = record.id, "Component inserted");

        let rows = evidence_rows(record.id, &submission, &uploads, now);
        let reconciled = reconcile(self.records.as_ref(), rows).await;
        info!(
            stage = %Stage::Reconciled,
            component_id = record.id,
            evidence = reconciled.records.len(),
            evidence_failed = reconciled.error.is_some(),
            "Evidence reconciled"
        );

        Ok(IngestReport {
            component: record,
            uploads,
            evidence: reconciled.records,
            evidence_error: reconciled.error,
            file_counts: file_counts(&self.schema, &submission),
        })
    }
}

fn stored_paths(
    uploads: &UploadOutcome,
    folders: &FolderReport,
    prefix: &ObjectPrefix,
) -> Vec<String> {
    let files = uploads.successes.values().flatten().map(|f| f.path.clone());
    let placeholders = folders
        .created
        .iter()
        .map(|c| prefix.object_path(*c, PLACEHOLDER_NAME));
    files.chain(placeholders).collect()
}
