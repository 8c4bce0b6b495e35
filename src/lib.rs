/*!
 * Atelier API
 *
 * Payment order and billing backend: opens gateway orders, verifies payment
 * callbacks, numbers invoices, and renders invoice/bill documents.
 */

use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::ToSchema;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::gateway::PaymentGateway;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    /// None when gateway credentials are absent; order creation and payment
    /// verification return 503 in that case, reads keep working.
    pub gateway: Option<Arc<dyn PaymentGateway>>,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Builds the `/api/v1` router. The development login route is only mounted
/// outside production; everything else sits behind bearer auth via the
/// `AuthUser` extractor.
pub fn api_v1_routes(state: &AppState) -> Router<AppState> {
    let mut router = Router::new()
        .nest("/payments", handlers::payments::payment_routes())
        .nest("/orders", handlers::orders::order_routes())
        .nest("/documents", handlers::documents::document_routes())
        .nest("/projects", handlers::documents::project_routes());

    if !state.config.is_production() {
        router = router.nest("/auth", handlers::auth::auth_routes());
    }

    router
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the full application router including status, health, docs and
/// the HTTP middleware stack (tracing, compression, timeout, CORS).
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes(&state))
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi_spec()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "service": "atelier-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health = json!({
        "status": if db_status == "healthy" { "ok" } else { "degraded" },
        "database": db_status,
        "gateway_configured": state.gateway.is_some(),
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health)))
}
