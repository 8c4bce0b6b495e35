mod common;

use axum::body;
use axum::http::{Method, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use uuid::Uuid;

use common::TestApp;

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

#[tokio::test]
async fn health_endpoint_reports_database_status() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["data"]["database"], "healthy");
    assert_eq!(body["data"]["gateway_configured"], true);
}

#[tokio::test]
async fn status_endpoint_is_public() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/status", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["service"], "atelier-api");
}

#[tokio::test]
async fn cross_origin_requests_get_cors_headers() {
    let app = TestApp::new().await;

    let response = app
        .request_with_headers(
            Method::GET,
            "/status",
            None,
            None,
            &[("origin", "https://app.example.com")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn login_issues_a_usable_token() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4();

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "user_id": user_id })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let token = body["data"]["access_token"].as_str().expect("access token");
    assert_eq!(body["data"]["token_type"], "Bearer");

    let listing = app
        .request(Method::GET, "/api/v1/orders", None, Some(token))
        .await;
    assert_eq!(listing.status(), StatusCode::OK);
}

#[tokio::test]
async fn order_creation_rejects_non_positive_amounts() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/payments/order",
            Some(json!({ "amount": "0" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("amount must be greater than zero"));
}

#[tokio::test]
async fn order_creation_rejects_bad_currency() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/payments/order",
            Some(json!({ "amount": "100", "currency": "RUPEES" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_are_listed_newest_first_and_scoped_to_caller() {
    let app = TestApp::new().await;

    for amount in ["100", "200", "300"] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/payments/order",
                Some(json!({ "amount": amount })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    // Another user's order must not appear in the caller's listing.
    app.seed_pending_order(
        Uuid::new_v4(),
        "order_other01",
        rust_decimal_macros::dec!(999),
        vec![],
    )
    .await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/orders", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let orders = body["data"]["orders"].as_array().expect("orders");
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(orders.len(), 3);
    for order in orders {
        assert_eq!(order["user_id"], json!(app.user_id));
    }
}

#[tokio::test]
async fn get_order_scopes_by_owner() {
    let app = TestApp::new().await;

    let foreign = app
        .seed_pending_order(Uuid::new_v4(), "order_other02", rust_decimal_macros::dec!(50), vec![])
        .await;

    let uri = format!("/api/v1/orders/{}", foreign.id);
    let response = app.request_authenticated(Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_requires_authentication() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/orders", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn pagination_limits_page_size() {
    let app = TestApp::new().await;

    for amount in ["10", "20", "30"] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/payments/order",
                Some(json!({ "amount": amount })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request_authenticated(Method::GET, "/api/v1/orders?page=1&per_page=2", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["data"]["orders"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["per_page"], 2);
}
