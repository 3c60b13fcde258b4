use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A customer booking request, tracked from submission through completion
/// or rejection. Assigned employees live in the `order_assignments` join
/// table so the ordered assignment list survives updates.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-readable order code, e.g. "OID-0412153045-k3qz". Unique.
    #[sea_orm(unique)]
    pub order_code: String,

    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: Option<String>,
    pub telephone: Option<String>,
    pub mobile: String,
    pub contact_method: Option<String>,
    pub guest_count: Option<String>,
    pub event_date: Date,
    pub comment: Option<String>,
    pub cart_total: Decimal,
    pub advance_payment: Decimal,
    pub due_payment: Decimal,
    pub status: String,
    pub slip_path: Option<String>,

    /// Optimistic token guarding the assignment persistence step.
    pub version: i32,

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

/// Flat three-state order machine: Pending (initial) with Completed and
/// Rejected as terminal states. Terminal states may be re-opened by an
/// admin correction; `OrderService::update_status` logs when that happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum OrderStatus {
    Pending,
    Completed,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Rejected)
    }
}
