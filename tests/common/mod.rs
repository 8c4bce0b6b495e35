use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use atelier_api::{
    app_router,
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::order::{self, LineItem, LineItems, ProjectRefs},
    errors::ServiceError,
    gateway::{signature, GatewayOrder, GatewayOrderRequest, PaymentGateway},
    AppState,
};

/// Shared secret the mock gateway setup uses; tests compute callback
/// signatures against it.
pub const TEST_GATEWAY_SECRET: &str = "test_gateway_secret";

/// In-process stand-in for the remote payment gateway.
pub struct MockGateway {
    counter: AtomicU64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, ServiceError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayOrder {
            id: format!("order_mock{:06}", n),
            amount: request.amount,
            currency: request.currency,
        })
    }
}

/// Helper harness for spinning up an application backed by a throwaway
/// SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    db_file: String,
    token: String,
    pub user_id: Uuid,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_file = format!("atelier_test_{}.db", Uuid::new_v4().simple());
        let _ = std::fs::remove_file(&db_file);

        let mut cfg = AppConfig::new(
            format!("sqlite://{db_file}?mode=rwc"),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.gateway_key_id = Some("rzp_test_key".to_string());
        cfg.gateway_key_secret = Some(TEST_GATEWAY_SECRET.to_string());

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let auth = Arc::new(AuthService::new(AuthConfig::new(
            cfg.jwt_secret.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        )));

        let user_id = Uuid::new_v4();
        let token = auth
            .generate_token(user_id)
            .expect("encode access token")
            .access_token;

        let state = AppState {
            db: Arc::new(pool),
            config: Arc::new(cfg),
            auth,
            gateway: Some(Arc::new(MockGateway::new())),
        };

        let router = app_router(state.clone());

        Self {
            router,
            state,
            db_file,
            token,
            user_id,
        }
    }

    /// Access the bearer token for the default test user.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Computes the HMAC callback signature the mock checkout would produce.
    pub fn sign(&self, gateway_order_id: &str, gateway_payment_id: &str) -> String {
        signature::expected_signature(TEST_GATEWAY_SECRET, gateway_order_id, gateway_payment_id)
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Like [`TestApp::request`], with extra headers.
    #[allow(dead_code)]
    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Insert a pending order row directly, bypassing the create endpoint.
    pub async fn seed_pending_order(
        &self,
        user_id: Uuid,
        gateway_order_id: &str,
        amount: Decimal,
        project_ids: Vec<Uuid>,
    ) -> order::Model {
        let now = Utc::now();
        order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            gateway_order_id: Set(gateway_order_id.to_string()),
            status: Set(order::STATUS_PENDING.to_string()),
            amount: Set(amount),
            subtotal: Set(Some(amount)),
            discount: Set(None),
            discount_type: Set(None),
            tax: Set(None),
            tax_rate: Set(None),
            currency: Set("INR".to_string()),
            items: Set(LineItems(vec![LineItem {
                title: "Seeded design work".to_string(),
                unit_price: amount,
                quantity: 1,
                area: None,
            }])),
            project_ids: Set(ProjectRefs(project_ids)),
            gateway_payment_id: Set(None),
            gateway_signature: Set(None),
            paid_at: Set(None),
            invoice_number: Set(None),
            invoice_date: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed pending order")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_file);
    }
}
