use crate::domain::payment::PaymentRequest;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod in_memory;
pub mod store_redis;

pub const QUEUE_KEY: &str = "payments:queue";
pub const DEAD_LETTER_KEY: &str = "payments:dead_letter";

/// Durable FIFO of serialized payments. `pop` must hand each item to exactly one caller.
#[async_trait::async_trait]
pub trait PaymentQueue: Send + Sync {
    async fn push(&self, payload: String) -> Result<()>;

    /// Waits at most `wait` for an item.
    async fn pop(&self, wait: Duration) -> Result<Option<String>>;

    async fn dead_letter(&self, entry: DeadLetter) -> Result<()>;

    async fn len(&self) -> Result<usize>;

    async fn ping(&self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedPayment {
    pub request: PaymentRequest,
    #[serde(default)]
    pub attempts: u32,
}

impl QueuedPayment {
    pub fn new(request: PaymentRequest) -> Self {
        Self { request, attempts: 0 }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub payload: String,
    pub reason: String,
    pub dead_lettered_at: chrono::DateTime<chrono::Utc>,
}

pub async fn enqueue(queue: &dyn PaymentQueue, request: PaymentRequest) -> Result<()> {
    queue.push(QueuedPayment::new(request).encode()?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decodes_payload_without_attempts() {
        let raw = r#"{"request":{"correlationId":"4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3","amount":"19.90","receivedAt":"2025-07-15T12:34:56.000Z"}}"#;
        let item = QueuedPayment::decode(raw).unwrap();
        assert_eq!(item.attempts, 0);
        assert_eq!(item.request.amount, dec!(19.90));
    }

    #[test]
    fn rejects_corrupt_payload() {
        assert!(QueuedPayment::decode("{not json").is_err());
        assert!(QueuedPayment::decode(r#"{"request":{"amount":"1"}}"#).is_err());
    }
}
