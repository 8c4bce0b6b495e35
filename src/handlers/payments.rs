use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::{
        orders::{CreateOrderRequest, CreateOrderResponse, OrderService},
        reconciliation::{ReconciliationService, ReconciliationSummary, VerifyPaymentRequest},
    },
    ApiResponse, AppState,
};

/// Create a gateway order and a matching pending local order
#[utoipa::path(
    post,
    path = "/api/v1/payments/order",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = crate::ApiResponse<CreateOrderResponse>),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway rejected the order", body = crate::errors::ErrorResponse),
        (status = 503, description = "Gateway not configured", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub(crate) async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreateOrderResponse>>), ServiceError> {
    let service = OrderService::new(
        state.db.clone(),
        state.gateway.clone(),
        state.config.default_currency.clone(),
    );
    let response = service.create_order(user.user_id, request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// Verify a gateway payment and mark the checkout batch paid
#[utoipa::path(
    post,
    path = "/api/v1/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Batch reconciled", body = crate::ApiResponse<ReconciliationSummary>),
        (status = 400, description = "Invalid signature or request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "No orders updated", body = crate::errors::ErrorResponse),
        (status = 503, description = "Gateway not configured", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub(crate) async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<ApiResponse<ReconciliationSummary>>, ServiceError> {
    let secret = state.config.gateway_secret()?.to_string();

    let service = ReconciliationService::new(state.db.clone(), secret);
    let summary = service.verify_payment(user.user_id, request).await?;

    Ok(Json(ApiResponse::success(summary)))
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/order", post(create_order))
        .route("/verify", post(verify_payment))
}
