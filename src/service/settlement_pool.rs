use crate::config::SettlementConfig;
use crate::domain::payment::SettlementRecord;
use crate::ledger::LedgerStore;
use crate::queue::{DeadLetter, PaymentQueue, QueuedPayment};
use crate::router::settlement_router::SettlementRouter;
use crate::service::retry_orchestrator::{after_failed_round, backoff_for, with_jitter, RetryDirective, RetryPolicy};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug)]
enum RoundOutcome {
    Settled(SettlementRecord),
    AlreadySettled,
    Unavailable(String),
    NotRecorded(String),
}

/// Fixed set of workers draining the queue into the ledger.
#[derive(Clone)]
pub struct SettlementPool {
    pub queue: Arc<dyn PaymentQueue>,
    pub ledger: Arc<dyn LedgerStore>,
    pub router: Arc<SettlementRouter>,
    pub config: SettlementConfig,
}

pub struct PoolHandle {
    workers: Vec<JoinHandle<()>>,
}

impl PoolHandle {
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Waits for every worker to drain. Call after the shutdown signal is sent.
    pub async fn join(self) {
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::error!("settlement worker panicked: {}", e);
            }
        }
    }
}

impl SettlementPool {
    pub fn start(&self, shutdown: watch::Receiver<bool>, worker_count: usize) -> PoolHandle {
        let worker_count = worker_count.max(1);
        tracing::info!(worker_count, "starting settlement pool");
        let workers = (0..worker_count)
            .map(|id| {
                let pool = self.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move { pool.run_worker(id, shutdown).await })
            })
            .collect();
        PoolHandle { workers }
    }

    fn policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config)
    }

    async fn run_worker(self, id: usize, mut shutdown: watch::Receiver<bool>) {
        let pop_wait = self.config.pop_wait.max(Duration::from_millis(10));
        loop {
            if *shutdown.borrow() {
                break;
            }

            // The pop is never cancelled: an item Redis already handed over must not be dropped.
            let payload = match self.queue.pop(pop_wait).await {
                Ok(Some(p)) => p,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(worker = id, "queue pop failed: {}", e);
                    sleep_unless_shutdown(with_jitter(self.config.retry_backoff), &mut shutdown).await;
                    continue;
                }
            };

            self.handle(id, payload, &shutdown).await;
        }
        tracing::info!(worker = id, "settlement worker stopped");
    }

    pub async fn handle(&self, worker: usize, payload: String, shutdown: &watch::Receiver<bool>) {
        let item = match QueuedPayment::decode(&payload) {
            Ok(item) => item,
            Err(e) => {
                tracing::error!(worker, "malformed queue payload: {}", e);
                self.dead_letter(payload, format!("malformed payload: {e}"), shutdown).await;
                return;
            }
        };

        let outcome = {
            let round = self.settle_and_record(&item);
            tokio::pin!(round);
            let mut signal = shutdown.clone();
            tokio::select! {
                out = &mut round => Some(out),
                _ = wait_for_shutdown(&mut signal) => {
                    tokio::time::timeout(self.config.shutdown_grace, &mut round).await.ok()
                }
            }
        };

        let correlation_id = item.request.correlation_id;
        match outcome {
            Some(RoundOutcome::Settled(record)) => {
                tracing::debug!(
                    worker,
                    correlation_id = %correlation_id,
                    processor = %record.processor,
                    "payment settled"
                );
            }
            Some(RoundOutcome::AlreadySettled) => {
                tracing::debug!(worker, correlation_id = %correlation_id, "redelivered payment already settled");
            }
            Some(RoundOutcome::Unavailable(reason)) | Some(RoundOutcome::NotRecorded(reason)) => {
                self.retry_or_dead_letter(item, reason, shutdown).await;
            }
            None => {
                tracing::warn!(worker, correlation_id = %correlation_id, "shutdown grace exceeded, requeueing");
                self.requeue(&item, shutdown).await;
            }
        }
    }

    async fn settle_and_record(&self, item: &QueuedPayment) -> RoundOutcome {
        let correlation_id = item.request.correlation_id;
        match self.ledger.contains(correlation_id).await {
            Ok(true) => return RoundOutcome::AlreadySettled,
            Ok(false) => {}
            // Both the processors and the ledger dedupe on correlation id, so carry on.
            Err(e) => tracing::warn!(correlation_id = %correlation_id, "ledger lookup failed: {}", e),
        }

        let record = match self.router.settle(&item.request).await {
            Ok(record) => record,
            Err(e) => return RoundOutcome::Unavailable(e.to_string()),
        };

        let policy = self.policy();
        let mut last_error = String::new();
        for attempt in 1..=policy.max_attempts {
            match self.ledger.insert(&record).await {
                Ok(true) => return RoundOutcome::Settled(record),
                Ok(false) => return RoundOutcome::AlreadySettled,
                Err(e) => {
                    tracing::error!(
                        correlation_id = %correlation_id,
                        attempt,
                        "ledger insert failed: {}",
                        e
                    );
                    last_error = e.to_string();
                    if attempt < policy.max_attempts {
                        tokio::time::sleep(backoff_for(attempt, &policy)).await;
                    }
                }
            }
        }
        RoundOutcome::NotRecorded(format!("ledger unavailable: {last_error}"))
    }

    async fn retry_or_dead_letter(&self, item: QueuedPayment, reason: String, shutdown: &watch::Receiver<bool>) {
        let correlation_id = item.request.correlation_id;
        match after_failed_round(item.attempts, &self.policy()) {
            RetryDirective::Requeue { attempts, backoff } => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    "settlement round failed, requeueing: {}",
                    reason
                );
                let mut signal = shutdown.clone();
                sleep_unless_shutdown(with_jitter(backoff), &mut signal).await;
                self.requeue(&QueuedPayment { attempts, ..item }, shutdown).await;
            }
            RetryDirective::DeadLetter { attempts } => {
                tracing::error!(correlation_id = %correlation_id, attempts, "settlement attempts exhausted: {}", reason);
                let payload = QueuedPayment { attempts, ..item }
                    .encode()
                    .unwrap_or_else(|_| correlation_id.to_string());
                self.dead_letter(payload, format!("attempts exhausted: {reason}"), shutdown)
                    .await;
            }
        }
    }

    async fn requeue(&self, item: &QueuedPayment, shutdown: &watch::Receiver<bool>) {
        let correlation_id = item.request.correlation_id;
        let payload = match item.encode() {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(correlation_id = %correlation_id, "cannot encode payment for requeue: {}", e);
                self.dead_letter(correlation_id.to_string(), format!("unencodable payment: {e}"), shutdown)
                    .await;
                return;
            }
        };
        let stored = self
            .store_until_accepted("requeue", shutdown, || self.queue.push(payload.clone()))
            .await;
        if !stored {
            tracing::error!(payload = %payload, "shutdown grace exceeded, payment not requeued");
        }
    }

    async fn dead_letter(&self, payload: String, reason: String, shutdown: &watch::Receiver<bool>) {
        let entry = DeadLetter {
            payload,
            reason,
            dead_lettered_at: chrono::Utc::now(),
        };
        let stored = self
            .store_until_accepted("dead-letter push", shutdown, || self.queue.dead_letter(entry.clone()))
            .await;
        if !stored {
            tracing::error!(
                payload = %entry.payload,
                reason = %entry.reason,
                "shutdown grace exceeded, dead-letter entry not stored"
            );
        }
    }

    /// Retries `op` with capped backoff until the queue accepts it. Retries only stop
    /// once shutdown is signalled and `shutdown_grace` has run out since then.
    async fn store_until_accepted<F, Fut>(&self, what: &str, shutdown: &watch::Receiver<bool>, mut op: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let policy = self.policy();
        let mut deadline: Option<Instant> = None;
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let e = match op().await {
                Ok(()) => return true,
                Err(e) => e,
            };
            tracing::error!(attempt, "{} failed: {}", what, e);

            let mut pause = with_jitter(backoff_for(attempt, &policy)).max(Duration::from_millis(1));
            if *shutdown.borrow() {
                let deadline = *deadline.get_or_insert_with(|| Instant::now() + self.config.shutdown_grace);
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return false;
                }
                pause = pause.min(remaining);
            }
            tokio::time::sleep(pause).await;
        }
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

async fn sleep_unless_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) {
    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = wait_for_shutdown(shutdown) => {}
    }
}
