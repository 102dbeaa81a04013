use crate::config::SettlementConfig;
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(cfg: &SettlementConfig) -> Self {
        Self {
            max_attempts: cfg.max_settlement_attempts.max(1),
            base_backoff: cfg.retry_backoff,
            max_backoff: cfg.retry_backoff * 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDirective {
    Requeue { attempts: u32, backoff: Duration },
    DeadLetter { attempts: u32 },
}

/// `attempts` is the number of failed rounds the item had before this one.
pub fn after_failed_round(attempts: u32, policy: &RetryPolicy) -> RetryDirective {
    let attempts = attempts.saturating_add(1);
    if attempts >= policy.max_attempts {
        RetryDirective::DeadLetter { attempts }
    } else {
        RetryDirective::Requeue {
            attempts,
            backoff: backoff_for(attempts, policy),
        }
    }
}

/// Exponential: base, 2×base, 4×base ... capped at `max_backoff`.
pub fn backoff_for(attempt: u32, policy: &RetryPolicy) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    policy
        .base_backoff
        .saturating_mul(1_u32 << exp)
        .min(policy.max_backoff)
}

/// Up to +25% so requeued items from many workers do not land together.
pub fn with_jitter(backoff: Duration) -> Duration {
    let quarter = backoff.as_millis() as u64 / 4;
    if quarter == 0 {
        return backoff;
    }
    backoff + Duration::from_millis(rand::thread_rng().gen_range(0..=quarter))
}
