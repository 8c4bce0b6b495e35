mod common;

use axum::body;
use axum::http::{Method, StatusCode};
use axum::response::Response;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

use common::TestApp;

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

async fn create_order(app: &TestApp, amount: &str) -> Value {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/payments/order",
            Some(json!({
                "amount": amount,
                "items": [
                    { "title": "Living room concept", "unit_price": amount, "quantity": 1 }
                ],
                "project_ids": [Uuid::new_v4()]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await
}

#[tokio::test]
async fn create_order_returns_gateway_order_id() {
    let app = TestApp::new().await;

    let body = create_order(&app, "2500").await;
    let data = &body["data"];

    assert_eq!(body["success"], true);
    assert!(data["gateway_order_id"]
        .as_str()
        .expect("gateway order id")
        .starts_with("order_mock"));
    assert_eq!(data["currency"], "INR");
    Uuid::parse_str(data["local_order_id"].as_str().expect("local order id"))
        .expect("local order id is a uuid");
}

#[tokio::test]
async fn verify_payment_marks_batch_paid_with_shared_invoice_number() {
    let app = TestApp::new().await;

    let first = create_order(&app, "100").await;
    let second = create_order(&app, "200").await;
    let gateway_order_id = first["data"]["gateway_order_id"].as_str().unwrap();
    let order_ids = [
        first["data"]["local_order_id"].as_str().unwrap(),
        second["data"]["local_order_id"].as_str().unwrap(),
    ];

    let signature = app.sign(gateway_order_id, "pay_test001");
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/payments/verify",
            Some(json!({
                "gateway_order_id": gateway_order_id,
                "gateway_payment_id": "pay_test001",
                "gateway_signature": signature,
                "order_ids": order_ids,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let data = &body["data"];
    let invoice_number = data["invoice_number"].as_str().expect("invoice number");
    assert!(invoice_number.starts_with("INV-"));

    let invoice_date = data["invoice_date"].as_str().expect("invoice date");
    let updated = data["updated"].as_array().expect("updated orders");
    assert_eq!(updated.len(), 2);
    for order in updated {
        assert_eq!(order["status"], "paid");
        assert_eq!(order["invoice_number"], invoice_number);
        assert_eq!(order["gateway_payment_id"], "pay_test001");
        // paid orders carry the complete payment/invoice field set
        assert_eq!(order["invoice_date"].as_str(), Some(invoice_date));
        assert!(order["paid_at"].as_str().is_some());
    }
    assert_eq!(data["skipped"].as_array().unwrap().len(), 0);

    // The stored rows also carry the gateway signature, which the API
    // response deliberately omits.
    use sea_orm::EntityTrait;
    for order in updated {
        let id = Uuid::parse_str(order["id"].as_str().unwrap()).unwrap();
        let row = atelier_api::entities::order::Entity::find_by_id(id)
            .one(&*app.state.db)
            .await
            .expect("fetch paid order")
            .expect("paid order exists");
        assert!(row.gateway_signature.is_some());
        assert!(row.paid_at.is_some());
        assert!(row.invoice_number.is_some());
        assert!(row.gateway_payment_id.is_some());
    }
}

#[tokio::test]
async fn verify_payment_rejects_bad_signature() {
    let app = TestApp::new().await;

    let created = create_order(&app, "500").await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/payments/verify",
            Some(json!({
                "gateway_order_id": created["data"]["gateway_order_id"],
                "gateway_payment_id": "pay_test002",
                "gateway_signature": "deadbeef",
                "order_ids": [created["data"]["local_order_id"]],
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The order must still be pending after a rejected callback.
    let order_uri = format!(
        "/api/v1/orders/{}",
        created["data"]["local_order_id"].as_str().unwrap()
    );
    let order = response_json(app.request_authenticated(Method::GET, &order_uri, None).await).await;
    assert_eq!(order["data"]["status"], "pending");
}

#[tokio::test]
async fn second_verification_of_same_order_reports_already_paid() {
    let app = TestApp::new().await;

    let created = create_order(&app, "750").await;
    let gateway_order_id = created["data"]["gateway_order_id"].as_str().unwrap().to_string();
    let local_order_id = created["data"]["local_order_id"].clone();
    let signature = app.sign(&gateway_order_id, "pay_test003");
    let payload = json!({
        "gateway_order_id": gateway_order_id,
        "gateway_payment_id": "pay_test003",
        "gateway_signature": signature,
        "order_ids": [local_order_id],
    });

    let first = app
        .request_authenticated(Method::POST, "/api/v1/payments/verify", Some(payload.clone()))
        .await;
    assert_eq!(first.status(), StatusCode::OK);

    // Every order in the batch is already paid, so the whole call fails.
    let second = app
        .request_authenticated(Method::POST, "/api/v1/payments/verify", Some(payload))
        .await;
    assert_eq!(second.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unknown_and_foreign_orders_are_skipped_not_fatal() {
    let app = TestApp::new().await;

    let mine = create_order(&app, "300").await;
    let foreign = app
        .seed_pending_order(Uuid::new_v4(), "order_foreign01", dec!(450), vec![])
        .await;
    let gateway_order_id = mine["data"]["gateway_order_id"].as_str().unwrap();

    let signature = app.sign(gateway_order_id, "pay_test004");
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/payments/verify",
            Some(json!({
                "gateway_order_id": gateway_order_id,
                "gateway_payment_id": "pay_test004",
                "gateway_signature": signature,
                "order_ids": [
                    mine["data"]["local_order_id"],
                    foreign.id,
                    Uuid::new_v4(),
                ],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let data = &body["data"];
    assert_eq!(data["updated"].as_array().unwrap().len(), 1);

    let skipped = data["skipped"].as_array().expect("skipped entries");
    assert_eq!(skipped.len(), 2);
    let reasons: Vec<&str> = skipped
        .iter()
        .map(|s| s["reason"].as_str().unwrap())
        .collect();
    assert!(reasons.contains(&"not_owned"));
    assert!(reasons.contains(&"not_found"));
}

#[tokio::test]
async fn paid_order_produces_a_bill_record_on_its_project() {
    let app = TestApp::new().await;

    let project_id = Uuid::new_v4();
    let order = app
        .seed_pending_order(app.user_id, "order_proj01", dec!(1200), vec![project_id])
        .await;

    let signature = app.sign("order_proj01", "pay_test005");
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/payments/verify",
            Some(json!({
                "gateway_order_id": "order_proj01",
                "gateway_payment_id": "pay_test005",
                "gateway_signature": signature,
                "order_ids": [order.id],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let bills_uri = format!("/api/v1/projects/{}/bills", project_id);
    let bills = response_json(app.request_authenticated(Method::GET, &bills_uri, None).await).await;
    let records = bills["data"].as_array().expect("bill records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["order_id"], json!(order.id));
    assert_eq!(records[0]["document_type"], "bill");
    let file_name = records[0]["file_name"].as_str().expect("file name");
    assert!(file_name.starts_with("BILL-"));
    assert_eq!(file_name.len(), "BILL-".len() + 8);
}

#[tokio::test]
async fn order_without_project_reference_pays_without_a_bill_record() {
    use atelier_api::entities::bill_record;
    use sea_orm::{EntityTrait, PaginatorTrait};

    let app = TestApp::new().await;

    let order = app
        .seed_pending_order(app.user_id, "order_noproj01", dec!(600), vec![])
        .await;

    let signature = app.sign("order_noproj01", "pay_test006");
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/payments/verify",
            Some(json!({
                "gateway_order_id": "order_noproj01",
                "gateway_payment_id": "pay_test006",
                "gateway_signature": signature,
                "order_ids": [order.id],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let bill_count = bill_record::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count bill records");
    assert_eq!(bill_count, 0);
}

#[tokio::test]
async fn verify_requires_authentication() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/verify",
            Some(json!({
                "gateway_order_id": "order_x",
                "gateway_payment_id": "pay_x",
                "gateway_signature": "sig",
                "order_ids": [Uuid::new_v4()],
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn consecutive_batches_get_distinct_invoice_numbers() {
    let app = TestApp::new().await;

    let mut numbers = Vec::new();
    for n in 0..2 {
        let created = create_order(&app, "100").await;
        let gateway_order_id = created["data"]["gateway_order_id"].as_str().unwrap().to_string();
        let payment_id = format!("pay_seq{:02}", n);
        let signature = app.sign(&gateway_order_id, &payment_id);
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/payments/verify",
                Some(json!({
                    "gateway_order_id": gateway_order_id,
                    "gateway_payment_id": payment_id,
                    "gateway_signature": signature,
                    "order_ids": [created["data"]["local_order_id"]],
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        numbers.push(body["data"]["invoice_number"].as_str().unwrap().to_string());
    }

    assert_ne!(numbers[0], numbers[1]);
}
