use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One purchased line item, stored as part of the order's JSON payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    /// Optional room/area tag (e.g. "Living Room")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, Default)]
pub struct LineItems(pub Vec<LineItem>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, Default)]
pub struct ProjectRefs(pub Vec<Uuid>);

/// A purchase order. Created `pending` by order creation; transitions exactly
/// once to `paid` by payment verification; never deleted by this subsystem.
///
/// Paid invariant: `status = "paid"` iff `gateway_payment_id`,
/// `gateway_signature`, `paid_at` and `invoice_number` are all set.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    #[sea_orm(unique)]
    pub gateway_order_id: String,

    pub status: String,

    /// Gross total in major currency units
    pub amount: Decimal,
    pub subtotal: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub discount_type: Option<String>,
    pub tax: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub currency: String,

    #[sea_orm(column_type = "Json")]
    pub items: LineItems,

    #[sea_orm(column_type = "Json")]
    pub project_ids: ProjectRefs,

    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,

    /// Shared across every order paid in the same checkout batch
    pub invoice_number: Option<String>,
    pub invoice_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Order status values stored in the `status` column.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PAID: &str = "paid";

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bill_record::Entity")]
    BillRecords,
}

impl Related<super::bill_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// True once payment verification has completed for this order.
    pub fn is_paid(&self) -> bool {
        self.status == STATUS_PAID
    }
}
