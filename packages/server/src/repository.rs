//! Relational persistence of components and their evidence rows.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait};
use tracing::instrument;

use crate::entity::{component, evidence, period};
use crate::ingest::model::{
    ComponentAttributes, ComponentRecord, EvidenceRecord, NewComponent, NewEvidence,
};

/// The relational store the ingest pipeline writes to.
#[async_trait]
pub trait ComponentStore: Send + Sync {
    /// Display name of a reporting period, if the id is known.
    async fn lookup_period_name(&self, period_id: i32) -> Result<Option<String>, DbErr>;

    async fn insert_component(&self, component: NewComponent) -> Result<ComponentRecord, DbErr>;

    /// Insert all rows or none of them.
    async fn insert_evidence_batch(
        &self,
        rows: Vec<NewEvidence>,
    ) -> Result<Vec<EvidenceRecord>, DbErr>;

    async fn ping(&self) -> Result<(), DbErr>;
}

pub struct SeaOrmComponentStore {
    db: DatabaseConnection,
}

impl SeaOrmComponentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ComponentStore for SeaOrmComponentStore {
    async fn lookup_period_name(&self, period_id: i32) -> Result<Option<String>, DbErr> {
        let found = period::Entity::find_by_id(period_id).one(&self.db).await?;
        Ok(found.map(|p| p.period))
    }

    #[instrument(skip_all, fields(cm_code = %new.cm_code, sku_code = %new.sku_code))]
    async fn insert_component(&self, new: NewComponent) -> Result<ComponentRecord, DbErr> {
        let a = new.attributes;
        let model = component::ActiveModel {
            cm_code: Set(new.cm_code),
            year: Set(new.year),
            periods: Set(new.periods),
            sku_code: Set(new.sku_code),
            component_code: Set(new.component_code),
            formulation_reference: Set(a.formulation_reference),
            material_type_id: Set(a.material_type_id),
            components_reference: Set(a.components_reference),
            component_description: Set(a.component_description),
            component_valid_from: Set(a.component_valid_from),
            component_valid_to: Set(a.component_valid_to),
            component_material_group: Set(a.component_material_group),
            component_quantity: Set(a.component_quantity),
            component_uom_id: Set(a.component_uom_id),
            component_base_quantity: Set(a.component_base_quantity),
            component_base_uom_id: Set(a.component_base_uom_id),
            percent_w_w: Set(a.percent_w_w),
            evidence: Set(a.evidence),
            component_packaging_type_id: Set(a.component_packaging_type_id),
            component_packaging_material: Set(a.component_packaging_material),
            helper_column: Set(a.helper_column),
            component_unit_weight: Set(a.component_unit_weight),
            component_unit_weight_id: Set(a.component_unit_weight_id),
            weight_unit_measure_id: Set(a.weight_unit_measure_id),
            percent_mechanical_pcr_content: Set(a.percent_mechanical_pcr_content),
            percent_mechanical_pir_content: Set(a.percent_mechanical_pir_content),
            percent_chemical_recycled_content: Set(a.percent_chemical_recycled_content),
            percent_bio_sourced: Set(a.percent_bio_sourced),
            material_structure_multimaterials: Set(a.material_structure_multimaterials),
            component_packaging_color_opacity: Set(a.component_packaging_color_opacity),
            component_packaging_level_id: Set(a.component_packaging_level_id),
            component_dimensions: Set(a.component_dimensions),
            packaging_specification_evidence: Set(a.packaging_specification_evidence),
            evidence_of_recycled_or_bio_source: Set(a.evidence_of_recycled_or_bio_source),
            document_status: Set(a.document_status),
            user_id: Set(a.user_id),
            is_active: Set(new.is_active),
            created_by: Set(new.created_by),
            created_date: Set(new.created_date),
            last_update_date: Set(new.last_update_date),
            ..Default::default()
        };

        let model = model.insert(&self.db).await?;
        Ok(component_record(model))
    }

    #[instrument(skip_all, fields(rows = rows.len()))]
    async fn insert_evidence_batch(
        &self,
        rows: Vec<NewEvidence>,
    ) -> Result<Vec<EvidenceRecord>, DbErr> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin().await?;
        let mut created = Vec::with_capacity(rows.len());
        for row in rows {
            let model = evidence::ActiveModel {
                component_id: Set(row.component_id),
                evidence_file_name: Set(row.evidence_file_name),
                evidence_file_url: Set(row.evidence_file_url),
                category: Set(row.category.label().to_string()),
                created_by: Set(row.created_by),
                created_date: Set(row.created_date),
                ..Default::default()
            };
            let model = model.insert(&txn).await?;
            created.push(EvidenceRecord {
                id: model.id,
                component_id: model.component_id,
                evidence_file_name: model.evidence_file_name,
                evidence_file_url: model.evidence_file_url,
                category: model.category,
                created_by: model.created_by,
                created_date: model.created_date,
            });
        }
        txn.commit().await?;

        Ok(created)
    }

    async fn ping(&self) -> Result<(), DbErr> {
        self.db.ping().await
    }
}

fn component_record(m: component::Model) -> ComponentRecord {
    ComponentRecord {
        id: m.id,
        cm_code: m.cm_code,
        year: m.year,
        periods: m.periods,
        sku_code: m.sku_code,
        component_code: m.component_code,
        attributes: ComponentAttributes {
            formulation_reference: m.formulation_reference,
            material_type_id: m.material_type_id,
            components_reference: m.components_reference,
            component_description: m.component_description,
            component_valid_from: m.component_valid_from,
            component_valid_to: m.component_valid_to,
            component_material_group: m.component_material_group,
            component_quantity: m.component_quantity,
            component_uom_id: m.component_uom_id,
            component_base_quantity: m.component_base_quantity,
            component_base_uom_id: m.component_base_uom_id,
            percent_w_w: m.percent_w_w,
            evidence: m.evidence,
            component_packaging_type_id: m.component_packaging_type_id,
            component_packaging_material: m.component_packaging_material,
            helper_column: m.helper_column,
            component_unit_weight: m.component_unit_weight,
            component_unit_weight_id: m.component_unit_weight_id,
            weight_unit_measure_id: m.weight_unit_measure_id,
            percent_mechanical_pcr_content: m.percent_mechanical_pcr_content,
            percent_mechanical_pir_content: m.percent_mechanical_pir_content,
            percent_chemical_recycled_content: m.percent_chemical_recycled_content,
            percent_bio_sourced: m.percent_bio_sourced,
            material_structure_multimaterials: m.material_structure_multimaterials,
            component_packaging_color_opacity: m.component_packaging_color_opacity,
            component_packaging_level_id: m.component_packaging_level_id,
            component_dimensions: m.component_dimensions,
            packaging_specification_evidence: m.packaging_specification_evidence,
            evidence_of_recycled_or_bio_source: m.evidence_of_recycled_or_bio_source,
            document_status: m.document_status,
            user_id: m.user_id,
        },
        is_active: m.is_active,
        created_by: m.created_by,
        created_date: m.created_date,
        last_update_date: m.last_update_date,
    }
}
