use crate::domain::payment::Processor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorHealth {
    pub processor: Processor,
    pub last_checked_at: Option<chrono::DateTime<chrono::Utc>>,
    pub healthy: bool,
    pub observed_latency_ms: u64,
    pub consecutive_failures: u32,
    /// Set while the processor's own health endpoint reports `failing`.
    pub probe_failing: bool,
}

impl ProcessorHealth {
    pub fn new(processor: Processor) -> Self {
        Self {
            processor,
            last_checked_at: None,
            healthy: true,
            observed_latency_ms: 0,
            consecutive_failures: 0,
            probe_failing: false,
        }
    }

    pub fn unhealthy(processor: Processor, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            last_checked_at: Some(now),
            healthy: false,
            ..Self::new(processor)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthSnapshot {
    pub default: ProcessorHealth,
    pub fallback: ProcessorHealth,
}

impl HealthSnapshot {
    pub fn get(&self, processor: Processor) -> &ProcessorHealth {
        match processor {
            Processor::Default => &self.default,
            Processor::Fallback => &self.fallback,
        }
    }
}

impl Default for HealthSnapshot {
    fn default() -> Self {
        Self {
            default: ProcessorHealth::new(Processor::Default),
            fallback: ProcessorHealth::new(Processor::Fallback),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthPolicy {
    pub failure_threshold: u32,
    pub latency_threshold_ms: u64,
    pub cooldown: std::time::Duration,
    pub tie_break: Processor,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            latency_threshold_ms: 1000,
            cooldown: std::time::Duration::from_secs(5),
            tie_break: Processor::Default,
        }
    }
}
