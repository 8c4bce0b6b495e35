use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derived, append-only accounting artifact. Exactly one per paid order that
/// carries at least one project reference.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bill_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// The order's first project reference
    pub project_id: Uuid,
    pub order_id: Uuid,
    pub document_type: String,

    /// Display name, `BILL-` + first 8 chars of the order id, uppercased
    pub file_name: String,

    /// Amount snapshot taken at payment time
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

pub const DOCUMENT_TYPE_BILL: &str = "bill";

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
