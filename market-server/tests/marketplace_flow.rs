//! End-to-end flow over the HTTP API against a real SQLite file

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Request, StatusCode};
use market_server::api::build_app;
use market_server::core::{Config, ServerState};
use market_server::db::DbService;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use shared::error::ErrorCode;
use shared::models::{
    BalanceReconciliation, OrderDetail, OrderStatus, PayoutStatus, RefundBatch, RefundDetail, RefundStatus,
    StockRecord, VariantAvailability, VendorBalance, VendorPayout,
};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _dir: TempDir,
    app: Router,
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

async fn seed(pool: &SqlitePool) {
    let statements = [
        "INSERT INTO organization (id, name, organization_type) VALUES (1, 'Acme', 'vendor')",
        "INSERT INTO product (id, organization_id, name) VALUES (11, 1, 'Kettle')",
        "INSERT INTO variant (id, product_id, sku, price, currency, weight_grams) \
         VALUES (11, 11, 'KET-1', 10000, 'USD', 1200)",
        "INSERT INTO location (id, organization_id, name) VALUES (11, 1, 'Main')",
        "INSERT INTO stock_record (variant_id, location_id, quantity, reserved, updated_at) VALUES (11, 11, 5, 0, 0)",
        "INSERT INTO commission_rule (id, scope, organization_type, fee_type, rate) \
         VALUES (1, 'organization_type', 'vendor', 'percentage', 1000)",
    ];
    for sql in statements {
        sqlx::query(sql).execute(pool).await.unwrap();
    }
}

async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("market.db");
    let path = path.to_str().unwrap();
    let db = DbService::new(path).await.unwrap();
    seed(&db.pool).await;
    let state = ServerState::with_db(Config::for_database(path), db);
    TestApp {
        _dir: dir,
        app: build_app(state),
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn ok<T: DeserializeOwned>(&self, method: &str, uri: &str, body: Option<Value>) -> T {
        let (status, bytes) = self.send(method, uri, body).await;
        assert_eq!(status, StatusCode::OK, "{method} {uri}: {}", String::from_utf8_lossy(&bytes));
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Status plus the error code from the body
    async fn err(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, u64) {
        let (status, bytes) = self.send(method, uri, body).await;
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        (status, body["code"].as_u64().unwrap())
    }
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;
    let body: Value = app.ok("GET", "/health", None).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["status"], "ok");
    assert!(!body["epoch"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_order_to_payout_flow() {
    let app = spawn_app().await;

    let order: OrderDetail = app
        .ok(
            "POST",
            "/api/orders",
            Some(json!({ "customer_id": 7, "items": [{ "variant_id": 11, "quantity": 2 }] })),
        )
        .await;
    let order_id = order.order.id;
    assert_eq!(order.order.status, OrderStatus::Pending);
    assert_eq!(order.order.total, dec("200"));
    assert_eq!(order.order.platform_fee_total, dec("20"));

    let availability: VariantAvailability = app.ok("GET", "/api/inventory/variants/11/availability", None).await;
    assert_eq!(availability.total_available, 3);

    for status in ["processing", "shipped", "delivered"] {
        let order: OrderDetail = app
            .ok(
                "POST",
                &format!("/api/orders/{order_id}/status"),
                Some(json!({ "status": status })),
            )
            .await;
        assert_eq!(order.order.status.as_str(), status);
    }

    let record: StockRecord = app.ok("GET", "/api/inventory/variants/11/locations/11", None).await;
    assert_eq!((record.quantity, record.reserved), (3, 0));

    let balance: VendorBalance = app.ok("GET", "/api/vendors/1/balance", None).await;
    assert_eq!(balance.available_balance, dec("180"));
    assert_eq!(balance.pending_balance, Decimal::ZERO);

    // refund one unit and return it to stock
    let line_id = order.lines[0].id;
    let batch: RefundBatch = app
        .ok(
            "POST",
            &format!("/api/orders/{order_id}/refunds"),
            Some(json!({ "reason": "dented", "items": [{ "order_line_id": line_id, "quantity": 1 }] })),
        )
        .await;
    assert!(batch.failures.is_empty());
    let refund = &batch.created[0].refund;
    assert_eq!(refund.amount, dec("100"));
    assert_eq!(refund.organization_amount, dec("90"));

    let refund_id = refund.id;
    let approved: RefundDetail = app.ok("POST", &format!("/api/refunds/{refund_id}/approve"), None).await;
    assert_eq!(approved.refund.status, RefundStatus::Approved);
    let completed: RefundDetail = app
        .ok(
            "POST",
            &format!("/api/refunds/{refund_id}/complete"),
            Some(json!({ "restock": true })),
        )
        .await;
    assert_eq!(completed.refund.status, RefundStatus::Completed);

    let record: StockRecord = app.ok("GET", "/api/inventory/variants/11/locations/11", None).await;
    assert_eq!(record.quantity, 4);
    let refunds: Vec<RefundDetail> = app.ok("GET", &format!("/api/orders/{order_id}/refunds"), None).await;
    assert_eq!(refunds.len(), 1);

    // pay out part of what is left
    let payout: VendorPayout = app
        .ok(
            "POST",
            "/api/vendors/1/payouts",
            Some(json!({ "amount": "50.00", "destination": "acct-001" })),
        )
        .await;
    assert_eq!(payout.status, PayoutStatus::Pending);
    let processed: VendorPayout = app
        .ok(
            "POST",
            &format!("/api/payouts/{}/process", payout.id),
            Some(json!({ "external_reference": "wire-42" })),
        )
        .await;
    assert_eq!(processed.status, PayoutStatus::Processed);
    assert_eq!(processed.external_reference.as_deref(), Some("wire-42"));

    let (status, code) = app
        .err("POST", &format!("/api/payouts/{}/process", payout.id), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code, u64::from(ErrorCode::PayoutAlreadyProcessed.code()));

    let balance: VendorBalance = app.ok("GET", "/api/vendors/1/balance", None).await;
    assert_eq!(balance.available_balance, dec("40"));
    assert_eq!(balance.total_paid_out, dec("50"));

    let reconciliation: BalanceReconciliation = app.ok("GET", "/api/vendors/1/reconcile", None).await;
    assert!(reconciliation.consistent);
    let transactions: Vec<Value> = app.ok("GET", "/api/vendors/1/transactions", None).await;
    // hold, release, debit, payout request, payout processed
    assert_eq!(transactions.len(), 5);
}

#[tokio::test]
async fn test_error_responses() {
    let app = spawn_app().await;

    let (status, code) = app.err("GET", "/api/orders/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(code, u64::from(ErrorCode::OrderNotFound.code()));

    let (status, code) = app
        .err(
            "POST",
            "/api/orders",
            Some(json!({ "customer_id": 7, "items": [{ "variant_id": 11, "quantity": 6 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(code, u64::from(ErrorCode::InsufficientStock.code()));

    let order: OrderDetail = app
        .ok(
            "POST",
            "/api/orders",
            Some(json!({ "customer_id": 7, "items": [{ "variant_id": 11, "quantity": 1 }] })),
        )
        .await;
    let (status, _) = app
        .err(
            "POST",
            &format!("/api/orders/{}/cancel", order.order.id),
            Some(json!({ "reason": "  " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, code) = app
        .err(
            "POST",
            &format!("/api/orders/{}/status", order.order.id),
            Some(json!({ "status": "delivered" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code, u64::from(ErrorCode::OrderInvalidState.code()));

    let (status, code) = app
        .err(
            "POST",
            "/api/inventory/adjust",
            Some(json!({ "variant_id": 11, "location_id": 11, "delta": -5, "reason": "recount" })),
        )
        .await;
    // one unit is still reserved by the open order
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code, u64::from(ErrorCode::ValueOutOfRange.code()));

    let (status, code) = app
        .err(
            "POST",
            "/api/vendors/999/payouts",
            Some(json!({ "amount": "1.00", "destination": "acct" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(code, u64::from(ErrorCode::OrganizationNotFound.code()));
}
