use payment_settlement::config::AppConfig;
use payment_settlement::domain::payment::Processor;
use payment_settlement::gateways::mock::MockGateway;
use payment_settlement::gateways::processor_http::HttpProcessorGateway;
use payment_settlement::gateways::PaymentGateway;
use payment_settlement::health::probe::HealthProbe;
use payment_settlement::health::state::HealthPolicy;
use payment_settlement::health::table::HealthTable;
use payment_settlement::ledger::store_redis::RedisLedger;
use payment_settlement::ledger::LedgerStore;
use payment_settlement::queue::store_redis::RedisPaymentQueue;
use payment_settlement::queue::PaymentQueue;
use payment_settlement::router::settlement_router::SettlementRouter;
use payment_settlement::service::settlement_pool::SettlementPool;
use payment_settlement::service::summary_service::SummaryService;
use payment_settlement::AppState;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    let settlement = cfg.settlement.clone();

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;
    let queue: Arc<dyn PaymentQueue> = Arc::new(RedisPaymentQueue::new(redis_client.clone()).await?);
    let ledger: Arc<dyn LedgerStore> = Arc::new(RedisLedger::new(redis_client).await?);

    let (default_gateway, fallback_gateway) = build_gateways(&cfg);
    let health_table = Arc::new(HealthTable::new(HealthPolicy {
        failure_threshold: settlement.health_failure_threshold,
        latency_threshold_ms: settlement.health_latency_threshold_ms,
        cooldown: settlement.health_cooldown,
        tie_break: settlement.tie_break,
    }));
    let router = Arc::new(SettlementRouter::new(
        default_gateway,
        fallback_gateway,
        health_table.clone(),
        settlement.attempt_timeout,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let probe = HealthProbe {
        gateways: router.gateways(),
        table: health_table.clone(),
        interval: settlement.health_probe_interval,
    };
    let probe_task = tokio::spawn(probe.run(shutdown_rx.clone()));

    let pool = SettlementPool {
        queue: queue.clone(),
        ledger: ledger.clone(),
        router,
        config: settlement.clone(),
    };
    let workers = pool.start(shutdown_rx.clone(), settlement.worker_count);

    let state = AppState {
        queue,
        summary_service: SummaryService { ledger },
        health_table,
    };
    let app = payment_settlement::http::router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("http server stopped, draining {} settlement workers", workers.worker_count());
    let _ = shutdown_tx.send(true);
    workers.join().await;
    let _ = probe_task.await;
    tracing::info!("shutdown complete");
    Ok(())
}

fn build_gateways(cfg: &AppConfig) -> (Arc<dyn PaymentGateway>, Arc<dyn PaymentGateway>) {
    if cfg.gateway_adapter == "MOCK" {
        tracing::warn!("using mock payment processors");
        return (
            Arc::new(MockGateway::new(Processor::Default, "ALWAYS_SUCCESS")),
            Arc::new(MockGateway::new(Processor::Fallback, "ALWAYS_SUCCESS")),
        );
    }

    let client = reqwest::Client::new();
    let timeout_ms = cfg.settlement.attempt_timeout.as_millis() as u64;
    (
        Arc::new(HttpProcessorGateway::new(
            Processor::Default,
            &cfg.processor_default_url,
            timeout_ms,
            client.clone(),
        )),
        Arc::new(HttpProcessorGateway::new(
            Processor::Fallback,
            &cfg.processor_fallback_url,
            timeout_ms,
            client,
        )),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
