use crate::domain::payment::{PaymentRequest, Processor, SettlementRecord};
use crate::gateways::{GatewayRequest, PaymentGateway};
use crate::health::evaluator::attempt_order;
use crate::health::table::HealthTable;
use chrono::SubsecRound;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("settlement unavailable after {attempts} processor attempts")]
    Unavailable { attempts: usize },
}

/// Picks a processor per attempt and fails over to the other one once.
pub struct SettlementRouter {
    default_gateway: Arc<dyn PaymentGateway>,
    fallback_gateway: Arc<dyn PaymentGateway>,
    health: Arc<HealthTable>,
    attempt_timeout: Duration,
}

impl SettlementRouter {
    pub fn new(
        default_gateway: Arc<dyn PaymentGateway>,
        fallback_gateway: Arc<dyn PaymentGateway>,
        health: Arc<HealthTable>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            default_gateway,
            fallback_gateway,
            health,
            attempt_timeout,
        }
    }

    pub fn health(&self) -> &Arc<HealthTable> {
        &self.health
    }

    pub fn gateways(&self) -> Vec<Arc<dyn PaymentGateway>> {
        vec![self.default_gateway.clone(), self.fallback_gateway.clone()]
    }

    fn gateway(&self, processor: Processor) -> &Arc<dyn PaymentGateway> {
        match processor {
            Processor::Default => &self.default_gateway,
            Processor::Fallback => &self.fallback_gateway,
        }
    }

    pub async fn settle(&self, request: &PaymentRequest) -> Result<SettlementRecord, SettlementError> {
        let snapshot = self.health.snapshot(chrono::Utc::now());
        let order = attempt_order(&snapshot, self.health.policy().tie_break);

        let mut attempts = 0;
        for processor in order {
            attempts += 1;
            if let Some(record) = self.attempt(processor, request).await {
                return Ok(record);
            }
        }

        Err(SettlementError::Unavailable { attempts })
    }

    async fn attempt(&self, processor: Processor, request: &PaymentRequest) -> Option<SettlementRecord> {
        let settled_at = chrono::Utc::now().trunc_subsecs(6);
        let gateway_request = GatewayRequest {
            correlation_id: request.correlation_id,
            amount: request.amount,
            requested_at: settled_at,
        };

        let start = Instant::now();
        let outcome = tokio::time::timeout(self.attempt_timeout, self.gateway(processor).settle(&gateway_request)).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(result)) if result.status.is_settled() => {
                self.health.record_success(processor, latency_ms, chrono::Utc::now());
                tracing::debug!(
                    correlation_id = %request.correlation_id,
                    processor = %processor,
                    latency_ms,
                    status = ?result.status,
                    "processor accepted payment"
                );
                Some(SettlementRecord {
                    correlation_id: request.correlation_id,
                    amount: request.amount,
                    processor,
                    settled_at,
                })
            }
            Ok(Ok(result)) => {
                self.health.record_failure(processor, chrono::Utc::now());
                tracing::warn!(
                    correlation_id = %request.correlation_id,
                    processor = %processor,
                    status = ?result.status,
                    error_code = result.error_code.as_deref().unwrap_or("none"),
                    "processor rejected payment"
                );
                None
            }
            Ok(Err(e)) => {
                self.health.record_failure(processor, chrono::Utc::now());
                tracing::warn!(correlation_id = %request.correlation_id, processor = %processor, "processor call failed: {}", e);
                None
            }
            Err(_) => {
                self.health.record_failure(processor, chrono::Utc::now());
                tracing::warn!(
                    correlation_id = %request.correlation_id,
                    processor = %processor,
                    timeout_ms = self.attempt_timeout.as_millis() as u64,
                    "processor call timed out"
                );
                None
            }
        }
    }
}
