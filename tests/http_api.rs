use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use payment_settlement::domain::payment::{Processor, SettlementRecord};
use payment_settlement::health::state::HealthPolicy;
use payment_settlement::health::table::HealthTable;
use payment_settlement::ledger::in_memory::InMemoryLedger;
use payment_settlement::ledger::LedgerStore;
use payment_settlement::queue::in_memory::InMemoryQueue;
use payment_settlement::queue::{PaymentQueue, QueuedPayment};
use payment_settlement::service::summary_service::SummaryService;
use payment_settlement::AppState;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct Fixture {
    app: axum::Router,
    queue: Arc<InMemoryQueue>,
    ledger: Arc<InMemoryLedger>,
}

fn fixture() -> Fixture {
    let queue = Arc::new(InMemoryQueue::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let state = AppState {
        queue: queue.clone(),
        summary_service: SummaryService { ledger: ledger.clone() },
        health_table: Arc::new(HealthTable::new(HealthPolicy::default())),
    };
    Fixture {
        app: payment_settlement::http::router(state),
        queue,
        ledger,
    }
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_payment(body: &str) -> Request<Body> {
    Request::post("/payments")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn accepted_payment_is_queued() {
    let f = fixture();
    let resp = f
        .app
        .oneshot(post_payment(
            r#"{"correlationId":"4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3","amount":19.90}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let v = body_json(resp).await;
    assert_eq!(v["correlationId"], "4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3");

    let raw = f.queue.pop(Duration::from_millis(10)).await.unwrap().unwrap();
    let item = QueuedPayment::decode(&raw).unwrap();
    assert_eq!(item.request.amount, dec!(19.90));
    assert_eq!(item.attempts, 0);
}

#[tokio::test]
async fn rejects_invalid_payments() {
    for body in [
        r#"{"correlationId":"4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3","amount":0}"#,
        r#"{"correlationId":"4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3","amount":-5}"#,
        r#"{"correlationId":"4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3","amount":0.004}"#,
        r#"{"correlationId":"4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3","amount":12.345}"#,
        r#"{"correlationId":"4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3","amount":1e20}"#,
        r#"{"correlationId":"00000000-0000-0000-0000-000000000000","amount":10}"#,
        r#"{"correlationId":"not-a-uuid","amount":10}"#,
        r#"{"amount":10}"#,
        "garbage",
    ] {
        let f = fixture();
        let resp = f.app.oneshot(post_payment(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(f.queue.len().await.unwrap(), 0);
    }
}

#[tokio::test]
async fn summary_reports_both_processors() {
    let f = fixture();
    f.ledger
        .insert(&SettlementRecord {
            correlation_id: uuid::Uuid::new_v4(),
            amount: dec!(100.00),
            processor: Processor::Fallback,
            settled_at: Utc::now(),
        })
        .await
        .unwrap();

    let resp = f
        .app
        .oneshot(Request::get("/payments-summary").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["default"]["totalRequests"], 0);
    assert_eq!(v["fallback"]["totalRequests"], 1);
    assert_eq!(v["fallback"]["totalAmount"], 100.0);
}

#[tokio::test]
async fn summary_with_range_filters_by_time() {
    let f = fixture();
    let old = Utc::now() - chrono::Duration::days(1);
    f.ledger
        .insert(&SettlementRecord {
            correlation_id: uuid::Uuid::new_v4(),
            amount: dec!(10.00),
            processor: Processor::Default,
            settled_at: old,
        })
        .await
        .unwrap();

    let from = (Utc::now() - chrono::Duration::hours(1)).to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let uri = format!("/payments-summary?from={from}");
    let resp = f.app.oneshot(Request::get(uri).body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["default"]["totalRequests"], 0);
}

#[tokio::test]
async fn invalid_range_is_client_error() {
    let f = fixture();
    let resp = f
        .app
        .oneshot(
            Request::get("/payments-summary?from=not-a-time&to=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v = body_json(resp).await;
    assert_eq!(v["error"]["code"], "INVALID_RANGE");
}

#[tokio::test]
async fn purge_clears_summary() {
    let f = fixture();
    f.ledger
        .insert(&SettlementRecord {
            correlation_id: uuid::Uuid::new_v4(),
            amount: dec!(1.00),
            processor: Processor::Default,
            settled_at: Utc::now(),
        })
        .await
        .unwrap();

    let resp = f
        .app
        .clone()
        .oneshot(Request::post("/purge-payments").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = f
        .app
        .oneshot(Request::get("/payments-summary").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let v = body_json(resp).await;
    assert_eq!(v["default"]["totalRequests"], 0);
    assert_eq!(v["default"]["totalAmount"], 0.0);
}
