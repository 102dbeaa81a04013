use crate::domain::payment::SettlementRecord;
use crate::domain::summary::SummaryView;
use anyhow::Result;
use chrono::{DateTime, Timelike, Utc};
use uuid::Uuid;

pub mod in_memory;
pub mod store_redis;

/// Persisted settlements. Totals and the time index move together, so
/// `get_summary()` always equals `get_summary_range(None, None)`.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Returns `false` when the correlation id was already counted; totals are left untouched.
    async fn insert(&self, record: &SettlementRecord) -> Result<bool>;

    async fn contains(&self, correlation_id: Uuid) -> Result<bool>;

    async fn get_summary(&self) -> Result<SummaryView>;

    /// Totals for `settled_at` in `[from, to)`; `None` is unbounded on that side.
    async fn get_summary_range(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<SummaryView>;

    /// Clears records, totals and the seen-set in one step.
    async fn purge_all(&self) -> Result<()>;
}

/// Index position of a settlement: epoch microseconds. Settlement times carry no finer precision.
pub fn index_micros(t: DateTime<Utc>) -> i64 {
    t.timestamp_micros()
}

/// First index position at or after `t`. A bound with sub-microsecond digits rounds up.
pub fn bound_micros(t: DateTime<Utc>) -> i64 {
    let micros = t.timestamp_micros();
    if t.nanosecond() % 1_000 == 0 {
        micros
    } else {
        micros + 1
    }
}
