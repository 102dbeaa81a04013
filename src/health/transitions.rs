use crate::health::state::{HealthPolicy, ProcessorHealth};

#[derive(Debug, Clone, Copy)]
pub enum Observation {
    Success { latency_ms: u64 },
    Failure,
    Probe { failing: bool, min_response_time_ms: u64 },
}

pub fn apply_observation(
    mut health: ProcessorHealth,
    policy: &HealthPolicy,
    observation: Observation,
    now: chrono::DateTime<chrono::Utc>,
) -> ProcessorHealth {
    match observation {
        Observation::Success { latency_ms } => {
            health.consecutive_failures = 0;
            health.observed_latency_ms = latency_ms;
            health.probe_failing = false;
        }
        Observation::Failure => {
            health.consecutive_failures = health.consecutive_failures.saturating_add(1);
        }
        Observation::Probe {
            failing,
            min_response_time_ms,
        } => {
            health.probe_failing = failing;
            health.observed_latency_ms = min_response_time_ms;
            if !failing {
                health.consecutive_failures = 0;
            }
        }
    }

    health.healthy = !health.probe_failing
        && health.consecutive_failures < policy.failure_threshold
        && health.observed_latency_ms <= policy.latency_threshold_ms;
    health.last_checked_at = Some(now);
    health
}

/// Health as seen by routing: an unhealthy mark older than the cooldown no longer excludes the processor.
pub fn effective(
    health: &ProcessorHealth,
    policy: &HealthPolicy,
    now: chrono::DateTime<chrono::Utc>,
) -> ProcessorHealth {
    let mut out = health.clone();
    if !out.healthy {
        let cooldown = chrono::Duration::from_std(policy.cooldown).unwrap_or(chrono::Duration::zero());
        if out.last_checked_at.is_some_and(|t| now >= t + cooldown) {
            out.healthy = true;
        }
    }
    out
}
