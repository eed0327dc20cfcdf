use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reporting period master data. Read-only from this service.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sdp_period")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name used in object paths, e.g. "FY25".
    pub period: String,

    pub is_active: bool,
}

impl ActiveModelBehavior for ActiveModel {}
