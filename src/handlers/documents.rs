use axum::{
    extract::{Path, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    entities::bill_record,
    errors::ServiceError,
    services::{bills::BillService, documents::DocumentService},
    ApiResponse, AppState,
};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BillRecordResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub order_id: Uuid,
    pub document_type: String,
    pub file_name: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<bill_record::Model> for BillRecordResponse {
    fn from(model: bill_record::Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            order_id: model.order_id,
            document_type: model.document_type,
            file_name: model.file_name,
            amount: model.amount,
            created_at: model.created_at,
        }
    }
}

/// Render the invoice for the order's checkout batch as HTML
#[utoipa::path(
    get,
    path = "/api/v1/documents/orders/{id}/invoice",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Invoice HTML", body = String, content_type = "text/html"),
        (status = 400, description = "Order has no invoice yet", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub(crate) async fn get_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ServiceError> {
    let html = DocumentService::new(state.db.clone())
        .render_invoice(user.user_id, id)
        .await?;
    Ok(Html(html))
}

/// Render the bill for a single order as HTML
#[utoipa::path(
    get,
    path = "/api/v1/documents/orders/{id}/bill",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Bill HTML", body = String, content_type = "text/html"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub(crate) async fn get_bill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ServiceError> {
    let html = DocumentService::new(state.db.clone())
        .render_bill(user.user_id, id)
        .await?;
    Ok(Html(html))
}

/// List bill records attached to a project
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/bills",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Bill records", body = crate::ApiResponse<Vec<BillRecordResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub(crate) async fn list_project_bills(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<BillRecordResponse>>>, ServiceError> {
    let records = BillService::new(state.db.clone()).list_for_project(id).await?;
    let records = records.into_iter().map(BillRecordResponse::from).collect();
    Ok(Json(ApiResponse::success(records)))
}

pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/:id/invoice", get(get_invoice))
        .route("/orders/:id/bill", get(get_bill))
}

pub fn project_routes() -> Router<AppState> {
    Router::new().route("/:id/bills", get(list_project_bills))
}
