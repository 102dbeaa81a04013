use crate::gateways::PaymentGateway;
use crate::health::table::HealthTable;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Polls each processor's service-health endpoint and feeds the health table.
pub struct HealthProbe {
    pub gateways: Vec<Arc<dyn PaymentGateway>>,
    pub table: Arc<HealthTable>,
    pub interval: Duration,
}

impl HealthProbe {
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if self.interval.is_zero() {
            return;
        }
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = shutdown.changed() => {
                    tracing::info!("health probe stopping");
                    break;
                }
            }
        }
    }

    pub async fn tick(&self) {
        for gateway in &self.gateways {
            let processor = gateway.processor();
            match gateway.service_health().await {
                Ok(health) => {
                    tracing::debug!(
                        processor = %processor,
                        failing = health.failing,
                        min_response_time = health.min_response_time,
                        "probe result"
                    );
                    self.table.record_probe(processor, &health, chrono::Utc::now());
                }
                // A missing health endpoint (rate limited, 429) is not a processor outage.
                Err(e) => tracing::debug!(processor = %processor, "health probe failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Processor;
    use crate::gateways::mock::MockGateway;
    use crate::health::state::HealthPolicy;

    #[tokio::test]
    async fn tick_records_failing_processor() {
        let table = Arc::new(HealthTable::new(HealthPolicy::default()));
        let probe = HealthProbe {
            gateways: vec![
                Arc::new(MockGateway::new(Processor::Default, "ALWAYS_FAILURE")),
                Arc::new(MockGateway::new(Processor::Fallback, "ALWAYS_SUCCESS")),
            ],
            table: table.clone(),
            interval: Duration::from_millis(10),
        };

        probe.tick().await;
        let snap = table.current();
        assert!(!snap.default.healthy);
        assert!(snap.fallback.healthy);
    }
}
