//! Required-field validation, component construction and period resolution.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{info, warn};

use super::model::{ComponentAttributes, ComponentSubmission, NewComponent};
use crate::repository::ComponentStore;
use crate::utils::filename::validate_flat_filename;

pub const REQUIRED_FIELDS: [&str; 4] = ["cm_code", "year", "sku_code", "component_code"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl ValidationError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Build a component from a classified submission.
///
/// Fails before anything is written if a required field is absent or blank,
/// if a value that becomes an object path segment is not a flat name, or if a
/// typed attribute does not parse. Blank optional attributes count as absent.
pub fn build_component(
    submission: &ComponentSubmission,
    now: DateTime<Utc>,
) -> Result<NewComponent, ValidationError> {
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .into_iter()
        .filter(|f| text(submission, f).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::Missing(missing));
    }

    let cm_code = path_segment(submission, "cm_code")?;
    let sku_code = path_segment(submission, "sku_code")?;
    let component_code = path_segment(submission, "component_code")?;
    let year = parse(submission, "year")?.ok_or(ValidationError::Missing(vec!["year"]))?;

    let attributes = ComponentAttributes {
        formulation_reference: owned(submission, "formulation_reference"),
        material_type_id: parse(submission, "material_type_id")?,
        components_reference: owned(submission, "components_reference"),
        component_description: owned(submission, "component_description"),
        component_valid_from: date(submission, "component_valid_from")?,
        component_valid_to: date(submission, "component_valid_to")?,
        component_material_group: owned(submission, "component_material_group"),
        component_quantity: parse(submission, "component_quantity")?,
        component_uom_id: parse(submission, "component_uom_id")?,
        component_base_quantity: parse(submission, "component_base_quantity")?,
        component_base_uom_id: parse(submission, "component_base_uom_id")?,
        percent_w_w: parse(submission, "percent_w_w")?,
        evidence: owned(submission, "evidence"),
        component_packaging_type_id: parse(submission, "component_packaging_type_id")?,
        component_packaging_material: owned(submission, "component_packaging_material"),
        helper_column: owned(submission, "helper_column"),
        component_unit_weight: parse(submission, "component_unit_weight")?,
        component_unit_weight_id: parse(submission, "component_unit_weight_id")?,
        weight_unit_measure_id: parse(submission, "weight_unit_measure_id")?,
        percent_mechanical_pcr_content: parse(submission, "percent_mechanical_pcr_content")?,
        percent_mechanical_pir_content: parse(submission, "percent_mechanical_pir_content")?,
        percent_chemical_recycled_content: parse(submission, "percent_chemical_recycled_content")?,
        percent_bio_sourced: parse(submission, "percent_bio_sourced")?,
        material_structure_multimaterials: owned(submission, "material_structure_multimaterials"),
        component_packaging_color_opacity: owned(submission, "component_packaging_color_opacity"),
        component_packaging_level_id: parse(submission, "component_packaging_level_id")?,
        component_dimensions: owned(submission, "component_dimensions"),
        packaging_specification_evidence: owned(submission, "packaging_specification_evidence"),
        evidence_of_recycled_or_bio_source: owned(submission, "evidence_of_recycled_or_bio_source"),
        document_status: owned(submission, "document_status"),
        user_id: parse(submission, "user_id")?,
    };

    Ok(NewComponent {
        cm_code,
        year,
        periods: None,
        sku_code,
        component_code,
        attributes,
        is_active: boolean(submission, "is_active")?.unwrap_or(true),
        created_by: owned(submission, "created_by"),
        created_date: date(submission, "created_date")?.unwrap_or(now),
        last_update_date: date(submission, "last_update_date")?.unwrap_or(now),
    })
}

/// The period a component is filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeriod {
    /// Display name, when the period id is known.
    pub name: Option<String>,
    /// First object path segment: the display name, or the raw id.
    pub path_segment: String,
}

/// Look up the display name of `period_id`.
///
/// Lookup failures and unknown ids fall back to the raw id and never fail the
/// request. A display name that is not a flat name also falls back.
pub async fn resolve_period(store: &dyn ComponentStore, period_id: i32) -> ResolvedPeriod {
    let fallback = |name: Option<String>| ResolvedPeriod {
        name,
        path_segment: period_id.to_string(),
    };

    match store.lookup_period_name(period_id).await {
        Ok(Some(name)) => match validate_flat_filename(&name) {
            Ok(segment) => ResolvedPeriod {
                path_segment: segment.to_string(),
                name: Some(name),
            },
            Err(e) => {
                warn!(
                    period_id,
                    %name,
                    reason = e.message(),
                    "Period name unusable in paths, using id"
                );
                fallback(Some(name))
            }
        },
        Ok(None) => {
            info!(period_id, "Unknown period id, using raw id in paths");
            fallback(None)
        }
        Err(e) => {
            warn!(period_id, error = %e, "Period lookup failed, using raw id in paths");
            fallback(None)
        }
    }
}

fn text<'a>(submission: &'a ComponentSubmission, field: &str) -> Option<&'a str> {
    submission
        .attribute(field)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn owned(submission: &ComponentSubmission, field: &str) -> Option<String> {
    text(submission, field).map(str::to_string)
}

fn path_segment(
    submission: &ComponentSubmission,
    field: &'static str,
) -> Result<String, ValidationError> {
    let value = text(submission, field).ok_or(ValidationError::Missing(vec![field]))?;
    validate_flat_filename(value)
        .map(str::to_string)
        .map_err(|e| ValidationError::invalid(field, e.message()))
}

fn parse<T: FromStr>(
    submission: &ComponentSubmission,
    field: &'static str,
) -> Result<Option<T>, ValidationError> {
    text(submission, field)
        .map(|v| {
            v.parse::<T>().map_err(|_| {
                ValidationError::invalid(field, format!("'{v}' is not a valid number"))
            })
        })
        .transpose()
}

fn boolean(
    submission: &ComponentSubmission,
    field: &'static str,
) -> Result<Option<bool>, ValidationError> {
    text(submission, field)
        .map(|v| match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ValidationError::invalid(field, format!("'{v}' is not a boolean"))),
        })
        .transpose()
}

/// RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
fn date(
    submission: &ComponentSubmission,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    text(submission, field)
        .map(|v| {
            if let Ok(ts) = DateTime::parse_from_rfc3339(v) {
                return Ok(ts.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
                .ok_or_else(|| ValidationError::invalid(field, format!("'{v}' is not a date")))
        })
        .transpose()
}
