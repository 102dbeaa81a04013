use crate::domain::payment::Processor;
use crate::gateways::ServiceHealth;
use crate::health::state::{HealthPolicy, HealthSnapshot, ProcessorHealth};
use crate::health::transitions::{apply_observation, effective, Observation};
use std::sync::RwLock;

/// Advisory per-processor health. Last write wins per processor.
pub struct HealthTable {
    policy: HealthPolicy,
    entries: RwLock<HealthSnapshot>,
}

impl HealthTable {
    pub fn new(policy: HealthPolicy) -> Self {
        Self::seeded(policy, HealthSnapshot::default())
    }

    pub fn seeded(policy: HealthPolicy, snapshot: HealthSnapshot) -> Self {
        Self {
            policy,
            entries: RwLock::new(snapshot),
        }
    }

    pub fn policy(&self) -> &HealthPolicy {
        &self.policy
    }

    /// Raw recorded state.
    pub fn current(&self) -> HealthSnapshot {
        self.entries
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// State used for routing, with expired unhealthy marks lifted.
    pub fn snapshot(&self, now: chrono::DateTime<chrono::Utc>) -> HealthSnapshot {
        let raw = self.current();
        HealthSnapshot {
            default: effective(&raw.default, &self.policy, now),
            fallback: effective(&raw.fallback, &self.policy, now),
        }
    }

    pub fn set(&self, health: ProcessorHealth) {
        self.update(health.processor, |_| health.clone());
    }

    pub fn record_success(&self, processor: Processor, latency_ms: u64, now: chrono::DateTime<chrono::Utc>) {
        self.observe(processor, Observation::Success { latency_ms }, now);
    }

    pub fn record_failure(&self, processor: Processor, now: chrono::DateTime<chrono::Utc>) {
        self.observe(processor, Observation::Failure, now);
    }

    pub fn record_probe(&self, processor: Processor, health: &ServiceHealth, now: chrono::DateTime<chrono::Utc>) {
        self.observe(
            processor,
            Observation::Probe {
                failing: health.failing,
                min_response_time_ms: health.min_response_time,
            },
            now,
        );
    }

    fn observe(&self, processor: Processor, observation: Observation, now: chrono::DateTime<chrono::Utc>) {
        let policy = self.policy.clone();
        self.update(processor, move |h| apply_observation(h.clone(), &policy, observation, now));
    }

    fn update(&self, processor: Processor, f: impl FnOnce(&ProcessorHealth) -> ProcessorHealth) {
        let mut guard = match self.entries.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let slot = match processor {
            Processor::Default => &mut guard.default,
            Processor::Fallback => &mut guard.fallback,
        };
        *slot = f(slot);
    }
}
