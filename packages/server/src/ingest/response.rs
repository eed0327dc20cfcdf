use std::collections::BTreeMap;

use super::category::CategorySchema;
use super::model::{ComponentRecord, ComponentSubmission, EvidenceRecord, UploadOutcome};
use crate::models::component::{ComponentIngestData, ComponentIngestResponse};

pub const SUCCESS_MESSAGE: &str = "Component detail added successfully";

/// Everything a persisted submission produced.
#[derive(Debug)]
pub struct IngestReport {
    pub component: ComponentRecord,
    pub uploads: UploadOutcome,
    pub evidence: Vec<EvidenceRecord>,
    pub evidence_error: Option<String>,
    pub file_counts: BTreeMap<String, usize>,
}

/// Files submitted per category, keyed by label, with every category present.
/// Scalar values posted under a file field are not counted.
pub fn file_counts(
    schema: &CategorySchema,
    submission: &ComponentSubmission,
) -> BTreeMap<String, usize> {
    schema
        .categories()
        .map(|c| {
            let count = submission.files_in(c).iter().filter(|f| f.is_file()).count();
            (c.label().to_string(), count)
        })
        .collect()
}

/// Build the response body. Partial failures stay inline; the request
/// counts as a success once the component exists.
pub fn assemble(report: IngestReport) -> ComponentIngestResponse {
    let issues = report.uploads.errors.len() + usize::from(report.evidence_error.is_some());
    let message = if issues == 0 {
        SUCCESS_MESSAGE.to_string()
    } else {
        format!("{SUCCESS_MESSAGE} with {issues} issue(s)")
    };

    ComponentIngestResponse {
        success: true,
        message,
        data: ComponentIngestData {
            component: report.component,
            file_uploads: report.uploads,
            evidence_records: report.evidence,
            file_counts: report.file_counts,
            evidence_error: report.evidence_error,
        },
    }
}
