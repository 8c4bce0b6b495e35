use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Monthly invoice-number counter, incremented transactionally so numbers
/// issued within one period are unique and gap-free under concurrency.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_counters")]
pub struct Model {
    /// Issue period, formatted `YYYYMM`
    #[sea_orm(primary_key, auto_increment = false)]
    pub period: String,
    pub last_value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
