use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sdp_evidence")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub component_id: i32,
    #[sea_orm(belongs_to, from = "component_id", to = "id")]
    pub component: HasOne<super::component::Entity>,

    /// Original upload filename.
    pub evidence_file_name: String,

    /// Object URL, or `pending-upload/{name}` when the upload failed.
    pub evidence_file_url: String,

    /// Category label, e.g. "Packaging Type".
    pub category: String,

    pub created_by: Option<String>,
    pub created_date: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
