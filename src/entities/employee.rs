use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Directory entry for an assignable employee.
///
/// `availability` is a denormalized boolean: true means free to assign.
/// The assignment coordinator is the only writer of this flag; it is kept
/// approximately equal to "not referenced by any current assignment".
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-readable employee code, e.g. "EMP-0412153045-x7pd". Unique.
    #[sea_orm(unique)]
    pub employee_code: String,

    pub name: String,
    pub email: String,
    pub phone: String,
    pub profile_image: Option<String>,
    pub availability: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_assignment::Entity")]
    OrderAssignment,
}

impl Related<super::order_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderAssignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
