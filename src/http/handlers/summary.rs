use crate::domain::payment::err;
use crate::service::summary_service::SummaryError;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn payments_summary(State(state): State<AppState>, Query(query): Query<SummaryQuery>) -> impl IntoResponse {
    let from = query.from.as_deref().filter(|s| !s.is_empty());
    let to = query.to.as_deref().filter(|s| !s.is_empty());

    let result = if from.is_some() || to.is_some() {
        state.summary_service.get_summary_with_time(from, to).await
    } else {
        state.summary_service.get_summary().await
    };

    match result {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(SummaryError::InvalidRange(reason)) => (
            StatusCode::BAD_REQUEST,
            Json(err("INVALID_RANGE", &reason)),
        )
            .into_response(),
        Err(SummaryError::Store(e)) => {
            tracing::error!("summary query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(err("SUMMARY_FAILED", "Failed to retrieve summary")),
            )
                .into_response()
        }
    }
}

pub async fn purge_payments(State(state): State<AppState>) -> impl IntoResponse {
    match state.summary_service.purge_all_data().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": "Payment data purged successfully"
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("purge failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(err("PURGE_FAILED", "Failed to purge payment data")),
            )
                .into_response()
        }
    }
}
