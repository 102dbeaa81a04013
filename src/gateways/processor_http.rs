use crate::domain::payment::Processor;
use crate::gateways::{GatewayRequest, GatewayResult, GatewayStatus, PaymentGateway, ServiceHealth};
use anyhow::Result;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessorPaymentBody {
    correlation_id: uuid::Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    requested_at: String,
}

/// Client for a payment processor speaking the `/payments` HTTP contract.
pub struct HttpProcessorGateway {
    pub processor: Processor,
    pub base_url: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl HttpProcessorGateway {
    pub fn new(processor: Processor, base_url: &str, timeout_ms: u64, client: reqwest::Client) -> Self {
        Self {
            processor,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms,
            client,
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for HttpProcessorGateway {
    fn processor(&self) -> Processor {
        self.processor
    }

    async fn settle(&self, request: &GatewayRequest) -> Result<GatewayResult> {
        let url = format!("{}/payments", self.base_url);
        let body = ProcessorPaymentBody {
            correlation_id: request.correlation_id,
            amount: request.amount,
            requested_at: request.requested_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };

        let resp = self
            .client
            .post(url)
            .header("Idempotency-Key", request.correlation_id.to_string())
            .json(&body)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await;

        let (status, error_code, error_message) = match resp {
            Ok(r) if r.status().is_success() => (GatewayStatus::Success, None, None),
            Ok(r) if r.status() == StatusCode::UNPROCESSABLE_ENTITY || r.status() == StatusCode::CONFLICT => {
                (GatewayStatus::Duplicate, Some(format!("HTTP_{}", r.status().as_u16())), None)
            }
            Ok(r) => {
                let code = r.status();
                let body = r.text().await.unwrap_or_default();
                let status = if code == StatusCode::REQUEST_TIMEOUT || code == StatusCode::GATEWAY_TIMEOUT {
                    GatewayStatus::Timeout
                } else {
                    GatewayStatus::Failure
                };
                (
                    status,
                    Some(format!("HTTP_{}", code.as_u16())),
                    Some(body.chars().take(200).collect()),
                )
            }
            Err(e) if e.is_timeout() => (
                GatewayStatus::Timeout,
                Some("TIMEOUT".to_string()),
                Some("processor timeout".to_string()),
            ),
            Err(e) => (
                GatewayStatus::Failure,
                Some("NETWORK_ERROR".to_string()),
                Some(e.to_string()),
            ),
        };

        Ok(GatewayResult {
            processor: self.processor,
            status,
            error_code,
            error_message,
        })
    }

    async fn service_health(&self) -> Result<ServiceHealth> {
        let url = format!("{}/payments/service-health", self.base_url);
        let health = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await?
            .error_for_status()?
            .json::<ServiceHealth>()
            .await?;
        Ok(health)
    }
}
