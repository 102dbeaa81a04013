use crate::domain::payment::{err, validate_amount, CreatePaymentRequest, CreatePaymentResponse, PaymentRequest};
use crate::queue::enqueue;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

pub async fn create_payment(
    State(state): State<AppState>,
    body: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(req)) = body else {
        return (StatusCode::BAD_REQUEST, Json(err("INVALID_BODY", "Invalid request body"))).into_response();
    };
    if let Err(reason) = validate_amount(req.amount) {
        return (StatusCode::BAD_REQUEST, Json(err("INVALID_AMOUNT", reason))).into_response();
    }
    if req.correlation_id.is_nil() {
        return (
            StatusCode::BAD_REQUEST,
            Json(err("MISSING_CORRELATION_ID", "CorrelationId is required")),
        )
            .into_response();
    }

    let request = PaymentRequest {
        correlation_id: req.correlation_id,
        amount: req.amount,
        received_at: chrono::Utc::now(),
    };

    match enqueue(state.queue.as_ref(), request).await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(CreatePaymentResponse {
                status: "success".to_string(),
                message: "Payment request accepted".to_string(),
                correlation_id: req.correlation_id,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(correlation_id = %req.correlation_id, "enqueue failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(err("ENQUEUE_FAILED", "Failed to process payment")),
            )
                .into_response()
        }
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
