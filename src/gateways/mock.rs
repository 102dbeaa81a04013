use crate::domain::payment::Processor;
use crate::gateways::{GatewayRequest, GatewayResult, GatewayStatus, PaymentGateway, ServiceHealth};
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

pub struct MockGateway {
    pub processor: Processor,
    behavior: RwLock<String>,
    latency: Duration,
    calls: AtomicUsize,
}

impl MockGateway {
    pub fn new(processor: Processor, behavior: &str) -> Self {
        Self {
            processor,
            behavior: RwLock::new(behavior.to_uppercase()),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_behavior(&self, behavior: &str) {
        if let Ok(mut b) = self.behavior.write() {
            *b = behavior.to_uppercase();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn behavior(&self) -> String {
        self.behavior
            .read()
            .map(|b| b.clone())
            .unwrap_or_else(|_| "ALWAYS_SUCCESS".to_string())
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn processor(&self) -> Processor {
        self.processor
    }

    async fn settle(&self, _request: &GatewayRequest) -> Result<GatewayResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let (status, error_code) = match self.behavior().as_str() {
            "ALWAYS_FAILURE" => (GatewayStatus::Failure, Some("MOCK_DECLINED")),
            "ALWAYS_TIMEOUT" => (GatewayStatus::Timeout, Some("MOCK_TIMEOUT")),
            "ALWAYS_ERROR" => anyhow::bail!("mock connection refused"),
            _ => (GatewayStatus::Success, None),
        };

        Ok(GatewayResult {
            processor: self.processor,
            status,
            error_code: error_code.map(ToString::to_string),
            error_message: None,
        })
    }

    async fn service_health(&self) -> Result<ServiceHealth> {
        Ok(ServiceHealth {
            failing: self.behavior() != "ALWAYS_SUCCESS",
            min_response_time: self.latency.as_millis() as u64,
        })
    }
}
