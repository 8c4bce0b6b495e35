//! Payment verification and order reconciliation.
//!
//! One call covers one checkout batch: the set of local order ids paid with a
//! single gateway transaction. The signature check guards the whole batch;
//! every later failure is isolated per order id so one bad id never forfeits
//! a legitimately-paid sibling.

use crate::{
    entities::order::{self, Entity as OrderEntity},
    errors::ServiceError,
    gateway::signature,
    services::{
        bills::BillService,
        invoice_numbers::InvoiceNumberService,
        orders::OrderResponse,
    },
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, message = "gateway order id is required"))]
    pub gateway_order_id: String,
    #[validate(length(min = 1, message = "gateway payment id is required"))]
    pub gateway_payment_id: String,
    #[validate(length(min = 1, message = "gateway signature is required"))]
    pub gateway_signature: String,
    /// The checkout batch: local order ids to mark paid together
    #[validate(length(min = 1, message = "at least one order id is required"))]
    pub order_ids: Vec<Uuid>,
}

/// Why an order id in the batch was not transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No order row with this id
    NotFound,
    /// The order belongs to a different user than the caller
    NotOwned,
    /// A concurrent call already transitioned the order
    AlreadyPaid,
    /// The conditional update failed at the store
    UpdateFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SkippedOrder {
    pub order_id: Uuid,
    pub reason: SkipReason,
}

/// Outcome of one verification call. Partial success is success: callers
/// inspect `skipped` to detect orders that did not transition.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ReconciliationSummary {
    pub invoice_number: String,
    pub invoice_date: DateTime<Utc>,
    pub updated: Vec<OrderResponse>,
    pub skipped: Vec<SkippedOrder>,
}

/// Verifies gateway callback signatures and transitions checkout batches
/// from `pending` to `paid`.
pub struct ReconciliationService {
    db: Arc<DatabaseConnection>,
    gateway_secret: String,
}

impl ReconciliationService {
    pub fn new(db: Arc<DatabaseConnection>, gateway_secret: String) -> Self {
        Self { db, gateway_secret }
    }

    /// Runs the reconciliation state machine for one checkout batch.
    ///
    /// Batch-level abort is reserved for the signature check, the one gate
    /// that is meaningless per-order. Per-order faults (missing row, foreign
    /// owner, concurrent payment, store error) skip that id and continue.
    #[instrument(skip(self, request), fields(caller = %caller, batch_size = request.order_ids.len()))]
    pub async fn verify_payment(
        &self,
        caller: Uuid,
        request: VerifyPaymentRequest,
    ) -> Result<ReconciliationSummary, ServiceError> {
        request.validate()?;

        if !signature::verify(
            &self.gateway_secret,
            &request.gateway_order_id,
            &request.gateway_payment_id,
            &request.gateway_signature,
        ) {
            warn!(
                gateway_order_id = %request.gateway_order_id,
                "Payment signature verification failed; aborting batch"
            );
            return Err(ServiceError::InvalidSignature);
        }

        // One invoice number and one timestamp for the whole batch.
        let invoice_date = Utc::now();
        let invoice_number = InvoiceNumberService::new(self.db.clone())
            .issue(invoice_date)
            .await;

        let bills = BillService::new(self.db.clone());
        let mut updated = Vec::new();
        let mut skipped = Vec::new();

        for order_id in &request.order_ids {
            match self
                .reconcile_one(caller, *order_id, &request, &invoice_number, invoice_date, &bills)
                .await
            {
                Ok(response) => updated.push(response),
                Err(reason) => {
                    warn!(order_id = %order_id, reason = ?reason, "Order skipped during reconciliation");
                    skipped.push(SkippedOrder {
                        order_id: *order_id,
                        reason,
                    });
                }
            }
        }

        if updated.is_empty() {
            error!(
                gateway_order_id = %request.gateway_order_id,
                skipped = skipped.len(),
                "No orders were updated for this payment"
            );
            return Err(ServiceError::NoOrdersUpdated);
        }

        info!(
            invoice_number = %invoice_number,
            updated = updated.len(),
            skipped = skipped.len(),
            "Checkout batch reconciled"
        );

        Ok(ReconciliationSummary {
            invoice_number,
            invoice_date,
            updated,
            skipped,
        })
    }

    /// fetch -> ownership check -> conditional update -> best-effort bill.
    async fn reconcile_one(
        &self,
        caller: Uuid,
        order_id: Uuid,
        request: &VerifyPaymentRequest,
        invoice_number: &str,
        invoice_date: DateTime<Utc>,
        bills: &BillService,
    ) -> Result<OrderResponse, SkipReason> {
        let fetched = match OrderEntity::find_by_id(order_id).one(&*self.db).await {
            Ok(Some(model)) => model,
            Ok(None) => return Err(SkipReason::NotFound),
            Err(e) => {
                error!(error = %e, order_id = %order_id, "Failed to fetch order");
                return Err(SkipReason::UpdateFailed);
            }
        };

        if fetched.user_id != caller {
            return Err(SkipReason::NotOwned);
        }

        if fetched.status != order::STATUS_PENDING {
            return Err(SkipReason::AlreadyPaid);
        }

        // Conditional write: only a still-pending row transitions, so two
        // concurrent verifications of the same order cannot both win.
        let update = OrderEntity::update_many()
            .col_expr(order::Column::Status, Expr::value(order::STATUS_PAID))
            .col_expr(
                order::Column::GatewayPaymentId,
                Expr::value(Some(request.gateway_payment_id.clone())),
            )
            .col_expr(
                order::Column::GatewaySignature,
                Expr::value(Some(request.gateway_signature.clone())),
            )
            .col_expr(order::Column::PaidAt, Expr::value(Some(invoice_date)))
            .col_expr(
                order::Column::InvoiceNumber,
                Expr::value(Some(invoice_number.to_string())),
            )
            .col_expr(order::Column::InvoiceDate, Expr::value(Some(invoice_date)))
            .col_expr(order::Column::UpdatedAt, Expr::value(Some(invoice_date)))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(order::STATUS_PENDING))
            .exec(&*self.db)
            .await;

        match update {
            Ok(result) if result.rows_affected == 0 => return Err(SkipReason::AlreadyPaid),
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, order_id = %order_id, "Failed to update order to paid");
                return Err(SkipReason::UpdateFailed);
            }
        }

        // Payment is authoritative; the bill record is best-effort.
        match fetched.project_ids.0.first() {
            Some(project_id) => {
                if let Err(e) = bills.create_for_order(&fetched, *project_id, invoice_date).await {
                    error!(
                        error = %e,
                        order_id = %order_id,
                        "Bill record creation failed; order remains paid"
                    );
                }
            }
            None => {
                warn!(order_id = %order_id, "Paid order has no project reference; no bill record created");
            }
        }

        let paid = order::Model {
            status: order::STATUS_PAID.to_string(),
            gateway_payment_id: Some(request.gateway_payment_id.clone()),
            gateway_signature: Some(request.gateway_signature.clone()),
            paid_at: Some(invoice_date),
            invoice_number: Some(invoice_number.to_string()),
            invoice_date: Some(invoice_date),
            updated_at: Some(invoice_date),
            ..fetched
        };

        Ok(OrderResponse::from(paid))
    }
}
