use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Post-order customer feedback. References the order by order code, not by
/// foreign key: a soft back-reference used for lookups only, never an
/// ownership edge.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_code: String,
    pub rating: i32,
    pub message: String,
    pub photo_path: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
