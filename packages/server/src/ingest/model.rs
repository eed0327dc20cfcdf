use std::collections::BTreeMap;

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::category::Category;

/// Content handed to the uploader for one file.
#[derive(Debug, Clone)]
pub enum FileBody {
    Binary(Bytes),
    /// A scalar value posted where a file was expected.
    Text(String),
}

/// A file entry of a classified submission.
#[derive(Debug, Clone)]
pub struct SubmittedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub body: Option<FileBody>,
}

impl SubmittedFile {
    /// Whether this entry carries file content, as opposed to a scalar value
    /// posted under a file field.
    pub fn is_file(&self) -> bool {
        !matches!(self.body, Some(FileBody::Text(_)))
    }
}

/// Identifies a file within a submission: its category and position there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileSlot {
    pub category: Category,
    pub index: usize,
}

/// A classified submission: plain attributes plus categorized files.
///
/// Built once by the classifier and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ComponentSubmission {
    attributes: BTreeMap<String, String>,
    files: BTreeMap<Category, Vec<SubmittedFile>>,
}

impl ComponentSubmission {
    pub fn new(
        attributes: BTreeMap<String, String>,
        files: BTreeMap<Category, Vec<SubmittedFile>>,
    ) -> Self {
        Self { attributes, files }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn files_in(&self, category: Category) -> &[SubmittedFile] {
        self.files.get(&category).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every file with its slot, in category order then arrival order.
    pub fn files(&self) -> impl Iterator<Item = (FileSlot, &SubmittedFile)> {
        self.files.iter().flat_map(|(category, files)| {
            files.iter().enumerate().map(move |(index, file)| {
                (
                    FileSlot {
                        category: *category,
                        index,
                    },
                    file,
                )
            })
        })
    }

    pub fn file_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

/// Optional business attributes of a component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, utoipa::ToSchema)]
pub struct ComponentAttributes {
    pub formulation_reference: Option<String>,
    pub material_type_id: Option<i32>,
    pub components_reference: Option<String>,
    pub component_description: Option<String>,
    pub component_valid_from: Option<DateTime<Utc>>,
    pub component_valid_to: Option<DateTime<Utc>>,
    pub component_material_group: Option<String>,
    pub component_quantity: Option<f64>,
    pub component_uom_id: Option<i32>,
    pub component_base_quantity: Option<f64>,
    pub component_base_uom_id: Option<i32>,
    pub percent_w_w: Option<f64>,
    pub evidence: Option<String>,
    pub component_packaging_type_id: Option<i32>,
    pub component_packaging_material: Option<String>,
    pub helper_column: Option<String>,
    pub component_unit_weight: Option<f64>,
    pub component_unit_weight_id: Option<i32>,
    pub weight_unit_measure_id: Option<i32>,
    pub percent_mechanical_pcr_content: Option<f64>,
    pub percent_mechanical_pir_content: Option<f64>,
    pub percent_chemical_recycled_content: Option<f64>,
    pub percent_bio_sourced: Option<f64>,
    pub material_structure_multimaterials: Option<String>,
    pub component_packaging_color_opacity: Option<String>,
    pub component_packaging_level_id: Option<i32>,
    pub component_dimensions: Option<String>,
    pub packaging_specification_evidence: Option<String>,
    pub evidence_of_recycled_or_bio_source: Option<String>,
    pub document_status: Option<String>,
    pub user_id: Option<i32>,
}

/// A validated component ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComponent {
    pub cm_code: String,
    /// Period reference id.
    pub year: i32,
    /// Resolved period name, if the lookup found one.
    pub periods: Option<String>,
    pub sku_code: String,
    pub component_code: String,
    pub attributes: ComponentAttributes,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_date: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
}

/// A persisted component row.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct ComponentRecord {
    pub id: i32,
    pub cm_code: String,
    pub year: i32,
    pub periods: Option<String>,
    pub sku_code: String,
    pub component_code: String,
    #[serde(flatten)]
    pub attributes: ComponentAttributes,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_date: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
}

impl ComponentRecord {
    pub fn from_new(id: i32, new: NewComponent) -> Self {
        Self {
            id,
            cm_code: new.cm_code,
            year: new.year,
            periods: new.periods,
            sku_code: new.sku_code,
            component_code: new.component_code,
            attributes: new.attributes,
            is_active: new.is_active,
            created_by: new.created_by,
            created_date: new.created_date,
            last_update_date: new.last_update_date,
        }
    }
}

/// A file that reached the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    #[schema(value_type = String, example = "Packaging Type")]
    pub category: Category,
    pub original_name: String,
    #[schema(example = "carton_1760601600000.pdf")]
    pub generated_name: String,
    pub url: String,
    pub size: u64,
    pub mime_type: String,
    #[serde(skip)]
    pub path: String,
    #[serde(skip)]
    pub slot: FileSlot,
}

/// Which pipeline stage rejected a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStage {
    /// The classifier could not recover a buffer; the file was never uploaded.
    Extraction,
    /// The file reached the uploader but was not stored.
    Upload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileError {
    pub file_name: String,
    #[schema(value_type = String, example = "Weight")]
    pub category: Category,
    pub stage: ErrorStage,
    pub reason: String,
    /// Set for files that reached the uploader.
    #[serde(skip)]
    pub slot: Option<FileSlot>,
}

/// Per-file results of a submission's uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    #[serde(rename = "uploadedFiles")]
    #[schema(value_type = Object)]
    pub successes: BTreeMap<Category, Vec<UploadedFile>>,
    pub errors: Vec<FileError>,
}

impl UploadOutcome {
    pub fn success_count(&self) -> usize {
        self.successes.values().map(Vec::len).sum()
    }

    pub fn success_for(&self, slot: FileSlot) -> Option<&UploadedFile> {
        self.successes
            .get(&slot.category)
            .and_then(|files| files.iter().find(|f| f.slot == slot))
    }
}

/// An evidence row ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvidence {
    pub component_id: i32,
    pub evidence_file_name: String,
    pub evidence_file_url: String,
    pub category: Category,
    pub created_by: Option<String>,
    pub created_date: DateTime<Utc>,
}

/// A persisted evidence row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct EvidenceRecord {
    pub id: i32,
    pub component_id: i32,
    pub evidence_file_name: String,
    pub evidence_file_url: String,
    pub category: String,
    pub created_by: Option<String>,
    pub created_date: DateTime<Utc>,
}
