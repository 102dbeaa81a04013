use crate::domain::payment::Processor;
use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub redis_url: String,
    pub processor_default_url: String,
    pub processor_fallback_url: String,
    pub gateway_adapter: String,
    pub settlement: SettlementConfig,
}

/// Knobs consumed by the settlement core. Everything here is supplied from outside.
#[derive(Debug, Clone)]
pub struct SettlementConfig {
    pub worker_count: usize,
    pub attempt_timeout: Duration,
    pub health_failure_threshold: u32,
    pub health_latency_threshold_ms: u64,
    pub health_cooldown: Duration,
    pub health_probe_interval: Duration,
    pub retry_backoff: Duration,
    pub max_settlement_attempts: u32,
    pub pop_wait: Duration,
    pub shutdown_grace: Duration,
    pub tie_break: Processor,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            worker_count: 10,
            attempt_timeout: Duration::from_millis(2000),
            health_failure_threshold: 3,
            health_latency_threshold_ms: 1000,
            health_cooldown: Duration::from_millis(5000),
            health_probe_interval: Duration::from_millis(5000),
            retry_backoff: Duration::from_millis(100),
            max_settlement_attempts: 5,
            pop_wait: Duration::from_millis(1000),
            shutdown_grace: Duration::from_millis(5000),
            tie_break: Processor::Default,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = SettlementConfig::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:9999".to_string()),
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_string()),
            processor_default_url: std::env::var("PROCESSOR_DEFAULT_URL")
                .unwrap_or_else(|_| "http://payment-processor-default:8080".to_string()),
            processor_fallback_url: std::env::var("PROCESSOR_FALLBACK_URL")
                .unwrap_or_else(|_| "http://payment-processor-fallback:8080".to_string()),
            gateway_adapter: std::env::var("GATEWAY_ADAPTER")
                .unwrap_or_else(|_| "HTTP".to_string())
                .to_uppercase(),
            settlement: SettlementConfig {
                worker_count: env_parse("WORKER_COUNT", defaults.worker_count).max(1),
                attempt_timeout: env_millis("ATTEMPT_TIMEOUT_MS", defaults.attempt_timeout),
                health_failure_threshold: env_parse(
                    "HEALTH_FAILURE_THRESHOLD",
                    defaults.health_failure_threshold,
                )
                .max(1),
                health_latency_threshold_ms: env_parse(
                    "HEALTH_LATENCY_THRESHOLD_MS",
                    defaults.health_latency_threshold_ms,
                ),
                health_cooldown: env_millis("HEALTH_COOLDOWN_MS", defaults.health_cooldown),
                health_probe_interval: env_millis(
                    "HEALTH_PROBE_INTERVAL_MS",
                    defaults.health_probe_interval,
                ),
                retry_backoff: env_millis("RETRY_BACKOFF_MS", defaults.retry_backoff),
                max_settlement_attempts: env_parse(
                    "MAX_SETTLEMENT_ATTEMPTS",
                    defaults.max_settlement_attempts,
                )
                .max(1),
                pop_wait: env_millis("POP_WAIT_MS", defaults.pop_wait),
                shutdown_grace: env_millis("SHUTDOWN_GRACE_MS", defaults.shutdown_grace),
                tie_break: std::env::var("TIE_BREAK_PROCESSOR")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.tie_break),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_millis(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
