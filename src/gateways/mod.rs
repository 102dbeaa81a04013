use crate::domain::payment::Processor;
use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod mock;
pub mod processor_http;

#[derive(Debug, Clone)]
pub struct GatewayRequest {
    /// Sent as the idempotency key as well.
    pub correlation_id: Uuid,
    pub amount: Decimal,
    pub requested_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayStatus {
    Success,
    /// The processor already holds this correlation id.
    Duplicate,
    Failure,
    Timeout,
}

impl GatewayStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, GatewayStatus::Success | GatewayStatus::Duplicate)
    }
}

#[derive(Debug, Clone)]
pub struct GatewayResult {
    pub processor: Processor,
    pub status: GatewayStatus,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub failing: bool,
    pub min_response_time: u64,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn processor(&self) -> Processor;

    async fn settle(&self, request: &GatewayRequest) -> Result<GatewayResult>;

    async fn service_health(&self) -> Result<ServiceHealth>;
}
