//! Per-file uploads into the object store.
//!
//! Every file of a submission gets exactly one result: a success entry under
//! its category or an error entry. Uploads run concurrently; results are
//! collected per slot and merged once all of them finished, so there is no
//! shared mutable state between in-flight uploads.

use axum::body::Bytes;
use common::storage::ObjectStore;
use futures::StreamExt;
use tracing::{debug, instrument, warn};

use super::layout::ObjectPrefix;
use super::model::{
    ComponentSubmission, ErrorStage, FileBody, FileError, FileSlot, UploadOutcome, UploadedFile,
};
use crate::utils::filename::{generated_name, next_upload_timestamp};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub const NO_FILE_DATA: &str = "No file data available";
pub const NOT_A_BUFFER: &str = "File data is not a byte buffer";
pub const EMPTY_FILE: &str = "File data is empty";

struct UploadJob {
    slot: FileSlot,
    original_name: String,
    generated_name: String,
    path: String,
    content_type: String,
    bytes: Bytes,
}

/// Check the body of a file before any network call is made.
fn guard_body(body: Option<&FileBody>) -> Result<&Bytes, &'static str> {
    match body {
        None => Err(NO_FILE_DATA),
        Some(FileBody::Text(_)) => Err(NOT_A_BUFFER),
        Some(FileBody::Binary(bytes)) if bytes.is_empty() => Err(EMPTY_FILE),
        Some(FileBody::Binary(bytes)) => Ok(bytes),
    }
}

/// Upload every file of `submission` under `prefix`.
///
/// Never fails as a whole: store errors and guard rejections are recorded as
/// upload-stage [`FileError`]s. `concurrency` bounds the number of in-flight
/// uploads and is clamped to at least one.
#[instrument(skip_all, fields(stage = "upload", prefix = %prefix.as_str(), files = submission.file_count()))]
pub async fn upload_files(
    store: &dyn ObjectStore,
    prefix: &ObjectPrefix,
    submission: &ComponentSubmission,
    concurrency: usize,
) -> UploadOutcome {
    let mut outcome = UploadOutcome::default();
    let mut jobs = Vec::new();

    for (slot, file) in submission.files() {
        outcome.successes.entry(slot.category).or_default();

        let bytes = match guard_body(file.body.as_ref()) {
            Ok(bytes) => bytes.clone(),
            Err(reason) => {
                warn!(
                    file_name = %file.file_name,
                    category = %slot.category,
                    reason,
                    "Skipping upload"
                );
                outcome.errors.push(upload_error(slot, &file.file_name, reason.to_string()));
                continue;
            }
        };

        // Names are taken here, in submission order, so the clock is never
        // read concurrently for the same prefix.
        let name = generated_name(&file.file_name, next_upload_timestamp());
        jobs.push(UploadJob {
            slot,
            original_name: file.file_name.clone(),
            path: prefix.object_path(slot.category, &name),
            generated_name: name,
            content_type: file
                .content_type
                .clone()
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            bytes,
        });
    }

    let results: Vec<Result<UploadedFile, FileError>> = futures::stream::iter(jobs)
        .map(|job| upload_one(store, job))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    for result in results {
        match result {
            Ok(uploaded) => outcome
                .successes
                .entry(uploaded.slot.category)
                .or_default()
                .push(uploaded),
            Err(error) => outcome.errors.push(error),
        }
    }

    for files in outcome.successes.values_mut() {
        files.sort_by_key(|f| f.slot);
    }
    outcome.errors.sort_by_key(|e| e.slot);

    outcome
}

async fn upload_one(store: &dyn ObjectStore, job: UploadJob) -> Result<UploadedFile, FileError> {
    match store.put_object(&job.path, &job.bytes, &job.content_type).await {
        Ok(url) => {
            debug!(path = %job.path, size = job.bytes.len(), "Uploaded evidence file");
            Ok(UploadedFile {
                category: job.slot.category,
                original_name: job.original_name,
                generated_name: job.generated_name,
                url,
                size: job.bytes.len() as u64,
                mime_type: job.content_type,
                path: job.path,
                slot: job.slot,
            })
        }
        Err(e) => {
            warn!(path = %job.path, error = %e, "Evidence upload failed");
            Err(upload_error(job.slot, &job.original_name, e.to_string()))
        }
    }
}

fn upload_error(slot: FileSlot, file_name: &str, reason: String) -> FileError {
    FileError {
        file_name: file_name.to_string(),
        category: slot.category,
        stage: ErrorStage::Upload,
        reason,
        slot: Some(slot),
    }
}
