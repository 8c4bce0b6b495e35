use crate::{
    entities::order::{self, Entity as OrderEntity, LineItem, LineItems, ProjectRefs},
    errors::ServiceError,
    gateway::{GatewayOrderRequest, PaymentGateway},
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Request to open a checkout order.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateOrderRequest {
    /// Gross total in major currency units
    pub amount: Decimal,
    /// ISO currency code; defaults to the configured currency when absent
    pub currency: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub project_ids: Vec<Uuid>,
    pub subtotal: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub discount_type: Option<String>,
    pub tax: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
}

impl CreateOrderRequest {
    /// Boundary validation beyond what the derive covers.
    fn check(&self) -> Result<(), ServiceError> {
        if self.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "amount must be greater than zero".to_string(),
            ));
        }
        if let Some(currency) = &self.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ServiceError::ValidationError(
                    "currency must be a 3-letter ISO code".to_string(),
                ));
            }
        }
        for item in &self.items {
            if item.title.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "line item title is required".to_string(),
                ));
            }
            if item.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "line item quantity must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateOrderResponse {
    /// Gateway-assigned order id, consumed by the client payment widget
    pub gateway_order_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub local_order_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub gateway_order_id: String,
    pub status: String,
    pub amount: Decimal,
    pub subtotal: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub discount_type: Option<String>,
    pub tax: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub currency: String,
    pub items: Vec<LineItem>,
    pub project_ids: Vec<Uuid>,
    pub gateway_payment_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            gateway_order_id: model.gateway_order_id,
            status: model.status,
            amount: model.amount,
            subtotal: model.subtotal,
            discount: model.discount,
            discount_type: model.discount_type,
            tax: model.tax,
            tax_rate: model.tax_rate,
            currency: model.currency,
            items: model.items.0,
            project_ids: model.project_ids.0,
            gateway_payment_id: model.gateway_payment_id,
            paid_at: model.paid_at,
            invoice_number: model.invoice_number,
            invoice_date: model.invoice_date,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Opens gateway orders and persists the local `pending` rows that mirror
/// them. The gateway client is injected so tests can run against a mock;
/// read operations work without one.
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    default_currency: String,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        default_currency: String,
    ) -> Self {
        Self {
            db,
            gateway,
            default_currency,
        }
    }

    /// Creates a local pending order backed by a fresh gateway order.
    ///
    /// The gateway is called first; a gateway failure leaves no local row.
    /// If the local insert fails after the gateway call succeeded, the remote
    /// order is orphaned (no compensating cancellation is attempted).
    #[instrument(skip(self, request), fields(user_id = %user_id, amount = %request.amount))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<CreateOrderResponse, ServiceError> {
        request.check()?;

        let currency = request
            .currency
            .clone()
            .unwrap_or_else(|| self.default_currency.clone());
        let order_id = Uuid::new_v4();
        let now = Utc::now();

        // Gateways take the amount in the smallest currency subunit.
        let amount_subunits = (request.amount * Decimal::from(100))
            .round()
            .to_i64()
            .ok_or_else(|| {
                ServiceError::ValidationError("amount out of representable range".to_string())
            })?;

        let gateway = self
            .gateway
            .as_ref()
            .ok_or(ServiceError::GatewayUnavailable)?;

        let gateway_order = gateway
            .create_order(GatewayOrderRequest {
                amount: amount_subunits,
                currency: currency.clone(),
                receipt: format!("rcpt_{}", order_id.simple()),
                notes: serde_json::json!({ "local_order_id": order_id }),
            })
            .await?;

        let active = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            gateway_order_id: Set(gateway_order.id.clone()),
            status: Set(order::STATUS_PENDING.to_string()),
            amount: Set(request.amount),
            subtotal: Set(request.subtotal),
            discount: Set(request.discount),
            discount_type: Set(request.discount_type),
            tax: Set(request.tax),
            tax_rate: Set(request.tax_rate),
            currency: Set(currency.clone()),
            items: Set(LineItems(request.items)),
            project_ids: Set(ProjectRefs(request.project_ids)),
            gateway_payment_id: Set(None),
            gateway_signature: Set(None),
            paid_at: Set(None),
            invoice_number: Set(None),
            invoice_date: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let model = active.insert(&*self.db).await.map_err(|e| {
            // The remote order already exists at this point; flag the orphan.
            error!(
                error = %e,
                order_id = %order_id,
                gateway_order_id = %gateway_order.id,
                "Failed to persist pending order; remote gateway order is orphaned"
            );
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            gateway_order_id = %model.gateway_order_id,
            "Pending order created"
        );

        Ok(CreateOrderResponse {
            gateway_order_id: model.gateway_order_id,
            amount: model.amount,
            currency: model.currency,
            local_order_id: model.id,
        })
    }

    /// Retrieves one of the caller's orders.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order");
                ServiceError::DatabaseError(e)
            })?;

        order.map(OrderResponse::from).ok_or_else(|| {
            warn!(order_id = %order_id, "Order not found for caller");
            ServiceError::NotFound(format!("Order {} not found", order_id))
        })
    }

    /// Lists the caller's orders, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let paginator = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count orders");
            ServiceError::DatabaseError(e)
        })?;

        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page, per_page, "Failed to fetch orders page");
                ServiceError::DatabaseError(e)
            })?;

        Ok(OrderListResponse {
            orders: orders.into_iter().map(OrderResponse::from).collect(),
            total,
            page,
            per_page,
        })
    }
}
