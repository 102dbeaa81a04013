use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let queue_ok = state.queue.ping().await.is_ok();
    let backlog = state.queue.len().await.ok();

    let status = if queue_ok {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "ready": queue_ok,
            "redis": queue_ok,
            "queue_backlog": backlog
        })),
    )
        .into_response()
}

pub async fn liveness() -> impl IntoResponse {
    (axum::http::StatusCode::OK, Json(serde_json::json!({"alive": true}))).into_response()
}

pub async fn processor_health(State(state): State<AppState>) -> impl IntoResponse {
    (axum::http::StatusCode::OK, Json(state.health_table.current())).into_response()
}
