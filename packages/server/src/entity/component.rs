use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sdp_component_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub cm_code: String,
    /// Period reference id.
    pub year: i32,
    /// Resolved period name at submission time.
    pub periods: Option<String>,
    pub sku_code: String,
    pub component_code: String,

    pub formulation_reference: Option<String>,
    pub material_type_id: Option<i32>,
    pub components_reference: Option<String>,
    pub component_description: Option<String>,
    pub component_valid_from: Option<DateTimeUtc>,
    pub component_valid_to: Option<DateTimeUtc>,
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

    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_date: DateTimeUtc,
    pub last_update_date: DateTimeUtc,

    #[sea_orm(has_many)]
    pub evidence_files: HasMany<super::evidence::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
