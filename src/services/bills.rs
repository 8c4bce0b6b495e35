use crate::{
    entities::{bill_record, order},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Creates and lists the append-only bill records that document paid orders
/// against their projects.
pub struct BillService {
    db: Arc<DatabaseConnection>,
}

impl BillService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates the bill record for a freshly paid order, against the order's
    /// first project reference.
    #[instrument(skip(self, order), fields(order_id = %order.id, project_id = %project_id))]
    pub async fn create_for_order(
        &self,
        order: &order::Model,
        project_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<bill_record::Model, ServiceError> {
        let record = bill_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            order_id: Set(order.id),
            document_type: Set(bill_record::DOCUMENT_TYPE_BILL.to_string()),
            file_name: Set(display_file_name(order.id)),
            amount: Set(order.amount),
            created_at: Set(created_at),
        };

        let model = record.insert(&*self.db).await.map_err(|e| {
            error!(error = %e, order_id = %order.id, "Failed to create bill record");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order.id,
            file_name = %model.file_name,
            "Bill record created"
        );
        Ok(model)
    }

    /// Lists bill records for a project, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<bill_record::Model>, ServiceError> {
        bill_record::Entity::find()
            .filter(bill_record::Column::ProjectId.eq(project_id))
            .order_by_desc(bill_record::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, project_id = %project_id, "Failed to list bill records");
                ServiceError::DatabaseError(e)
            })
    }
}

/// Display name for a bill document: `BILL-` plus the first 8 characters of
/// the order id, uppercased.
pub fn display_file_name(order_id: Uuid) -> String {
    format!("BILL-{}", order_id.to_string()[..8].to_uppercase())
}
