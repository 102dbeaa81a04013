use crate::AppState;
use axum::routing::{get, post};
use axum::Router;

pub mod handlers {
    pub mod ops;
    pub mod payments;
    pub mod summary;
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::payments::health))
        .route("/payments", post(handlers::payments::create_payment))
        .route("/payments-summary", get(handlers::summary::payments_summary))
        .route("/purge-payments", post(handlers::summary::purge_payments))
        .route("/processors/health", get(handlers::ops::processor_health))
        .route("/ops/readiness", get(handlers::ops::readiness))
        .route("/ops/liveness", get(handlers::ops::liveness))
        .with_state(state)
}
