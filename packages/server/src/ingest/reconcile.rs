use chrono::{DateTime, Utc};
use tracing::{error, instrument};

use super::model::{ComponentSubmission, EvidenceRecord, NewEvidence, UploadOutcome};
use crate::repository::ComponentStore;

pub const PENDING_URL_PREFIX: &str = "pending-upload/";

pub fn pending_url(file_name: &str) -> String {
    format!("{PENDING_URL_PREFIX}{file_name}")
}

/// One evidence row per file that reached the uploader.
///
/// Successful uploads carry their object URL. Everything else carries a
/// pending sentinel naming the original file. Scalar values posted under a
/// file field have no original file and get no row.
pub fn evidence_rows(
    component_id: i32,
    submission: &ComponentSubmission,
    outcome: &UploadOutcome,
    now: DateTime<Utc>,
) -> Vec<NewEvidence> {
    let created_by = submission
        .attribute("created_by")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    submission
        .files()
        .filter(|(_, file)| file.is_file())
        .map(|(slot, file)| NewEvidence {
            component_id,
            evidence_file_name: file.file_name.clone(),
            evidence_file_url: match outcome.success_for(slot) {
                Some(uploaded) => uploaded.url.clone(),
                None => pending_url(&file.file_name),
            },
            category: slot.category,
            created_by: created_by.clone(),
            created_date: now,
        })
        .collect()
}

/// Result of the evidence batch insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub records: Vec<EvidenceRecord>,
    /// Set when the batch insert failed. The component row stays in place.
    pub error: Option<String>,
}

#[instrument(skip_all, fields(stage = "reconcile", rows = rows.len()))]
pub async fn reconcile(store: &dyn ComponentStore, rows: Vec<NewEvidence>) -> Reconciled {
    if rows.is_empty() {
        return Reconciled::default();
    }

    match store.insert_evidence_batch(rows).await {
        Ok(records) => Reconciled {
            records,
            error: None,
        },
        Err(e) => {
            error!(error = %e, "Evidence batch insert failed");
            Reconciled {
                records: Vec::new(),
                error: Some(format!("Failed to save evidence records: {e}")),
            }
        }
    }
}
