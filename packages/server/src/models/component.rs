use std::collections::BTreeMap;

use serde::Serialize;

use crate::ingest::model::{ComponentRecord, EvidenceRecord, UploadOutcome};

/// Response envelope of a component submission.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ComponentIngestResponse {
    pub success: bool,
    #[schema(example = "Component detail added successfully")]
    pub message: String,
    pub data: ComponentIngestData,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentIngestData {
    /// The persisted component row.
    pub component: ComponentRecord,
    /// Per-file upload results, grouped by category label.
    pub file_uploads: UploadOutcome,
    /// Evidence rows written for this component. Empty when `evidenceError` is set.
    pub evidence_records: Vec<EvidenceRecord>,
    /// Files submitted per category label. All four labels are always present.
    #[schema(example = json!({"Weight": 2, "weightUOM": 0, "Packaging Type": 0, "Material Type": 0}))]
    pub file_counts: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_error: Option<String>,
}

/// Multipart form of a component submission, for documentation only.
///
/// The body is read field by field; files go under `category{n}_files`.
#[derive(utoipa::ToSchema)]
pub struct ComponentForm {
    #[schema(example = "CM1")]
    pub cm_code: String,
    /// Period reference id.
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = "SKU1")]
    pub sku_code: String,
    #[schema(example = "COMP1")]
    pub component_code: String,
    pub created_by: Option<String>,
    /// Weight evidence.
    #[schema(value_type = Option<Vec<String>>, format = Binary)]
    pub category1_files: Option<Vec<Vec<u8>>>,
    /// weightUOM evidence.
    #[schema(value_type = Option<Vec<String>>, format = Binary)]
    pub category2_files: Option<Vec<Vec<u8>>>,
    /// Packaging Type evidence.
    #[schema(value_type = Option<Vec<String>>, format = Binary)]
    pub category3_files: Option<Vec<Vec<u8>>>,
    /// Material Type evidence.
    #[schema(value_type = Option<Vec<String>>, format = Binary)]
    pub category4_files: Option<Vec<Vec<u8>>>,
}

/// Health probe result.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
}
