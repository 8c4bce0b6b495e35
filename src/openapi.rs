//! OpenAPI document assembly.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::auth::login,
        crate::handlers::payments::create_order,
        crate::handlers::payments::verify_payment,
        crate::handlers::orders::get_order,
        crate::handlers::orders::list_orders,
        crate::handlers::documents::get_invoice,
        crate::handlers::documents::get_bill,
        crate::handlers::documents::list_project_bills,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::auth::LoginRequest,
        crate::handlers::documents::BillRecordResponse,
        crate::auth::TokenResponse,
        crate::entities::order::LineItem,
        crate::services::orders::CreateOrderRequest,
        crate::services::orders::CreateOrderResponse,
        crate::services::orders::OrderResponse,
        crate::services::orders::OrderListResponse,
        crate::services::reconciliation::VerifyPaymentRequest,
        crate::services::reconciliation::SkipReason,
        crate::services::reconciliation::SkippedOrder,
        crate::services::reconciliation::ReconciliationSummary,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Development token issuance"),
        (name = "Payments", description = "Gateway orders and payment verification"),
        (name = "Orders", description = "Order queries"),
        (name = "Documents", description = "Invoice and bill rendering")
    ),
    info(
        title = "Atelier API",
        description = "Payment order reconciliation and billing service"
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    pub fn openapi_spec() -> utoipa::openapi::OpenApi {
        <Self as OpenApi>::openapi()
    }
}
