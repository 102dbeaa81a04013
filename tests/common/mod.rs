#![allow(dead_code)]

use payment_settlement::config::SettlementConfig;
use payment_settlement::domain::payment::{PaymentRequest, Processor, SettlementRecord};
use payment_settlement::gateways::mock::MockGateway;
use payment_settlement::health::state::HealthPolicy;
use payment_settlement::health::table::HealthTable;
use payment_settlement::ledger::in_memory::InMemoryLedger;
use payment_settlement::queue::in_memory::InMemoryQueue;
use payment_settlement::queue::{DeadLetter, PaymentQueue};
use payment_settlement::router::settlement_router::SettlementRouter;
use payment_settlement::service::settlement_pool::SettlementPool;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub fn fast_config() -> SettlementConfig {
    SettlementConfig {
        worker_count: 4,
        attempt_timeout: Duration::from_millis(200),
        retry_backoff: Duration::from_millis(2),
        pop_wait: Duration::from_millis(20),
        shutdown_grace: Duration::from_millis(50),
        health_probe_interval: Duration::ZERO,
        ..SettlementConfig::default()
    }
}

pub struct Harness {
    pub queue: Arc<InMemoryQueue>,
    pub ledger: Arc<InMemoryLedger>,
    pub default_gateway: Arc<MockGateway>,
    pub fallback_gateway: Arc<MockGateway>,
    pub pool: SettlementPool,
}

pub fn harness(config: SettlementConfig, default_gateway: MockGateway, fallback_gateway: MockGateway) -> Harness {
    let queue = Arc::new(InMemoryQueue::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let default_gateway = Arc::new(default_gateway);
    let fallback_gateway = Arc::new(fallback_gateway);
    let table = Arc::new(HealthTable::new(HealthPolicy {
        failure_threshold: config.health_failure_threshold,
        latency_threshold_ms: config.health_latency_threshold_ms,
        cooldown: config.health_cooldown,
        tie_break: config.tie_break,
    }));
    let router = Arc::new(SettlementRouter::new(
        default_gateway.clone(),
        fallback_gateway.clone(),
        table,
        config.attempt_timeout,
    ));
    let pool = SettlementPool {
        queue: queue.clone(),
        ledger: ledger.clone(),
        router,
        config,
    };
    Harness {
        queue,
        ledger,
        default_gateway,
        fallback_gateway,
        pool,
    }
}

pub fn payment(amount: Decimal) -> PaymentRequest {
    PaymentRequest {
        correlation_id: Uuid::new_v4(),
        amount,
        received_at: chrono::Utc::now(),
    }
}

pub fn record(processor: Processor, amount: Decimal, settled_at: chrono::DateTime<chrono::Utc>) -> SettlementRecord {
    SettlementRecord {
        correlation_id: Uuid::new_v4(),
        amount,
        processor,
        settled_at,
    }
}

/// Polls `check` until it returns true or five seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Queue whose first `failures` writes (pushes and dead-letters) error, as during a store outage.
pub struct FlakyQueue {
    pub inner: Arc<InMemoryQueue>,
    failures: usize,
    writes: AtomicUsize,
}

impl FlakyQueue {
    pub fn new(inner: Arc<InMemoryQueue>, failures: usize) -> Self {
        Self {
            inner,
            failures,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn fail_write(&self) -> anyhow::Result<()> {
        if self.writes.fetch_add(1, Ordering::SeqCst) < self.failures {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PaymentQueue for FlakyQueue {
    async fn push(&self, payload: String) -> anyhow::Result<()> {
        self.fail_write()?;
        self.inner.push(payload).await
    }

    async fn pop(&self, wait: Duration) -> anyhow::Result<Option<String>> {
        self.inner.pop(wait).await
    }

    async fn dead_letter(&self, entry: DeadLetter) -> anyhow::Result<()> {
        self.fail_write()?;
        self.inner.dead_letter(entry).await
    }

    async fn len(&self) -> anyhow::Result<usize> {
        self.inner.len().await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.inner.ping().await
    }
}
