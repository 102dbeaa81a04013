use crate::domain::payment::{Processor, SettlementRecord};
use crate::domain::summary::SummaryView;
use crate::ledger::{bound_micros, index_micros, LedgerStore};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct LedgerState {
    seen: HashSet<Uuid>,
    totals: SummaryView,
    by_time: BTreeMap<(i64, Uuid), (Processor, Decimal)>,
}

/// Same contract as the Redis ledger. One lock covers all three structures.
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedger {
    async fn insert(&self, record: &SettlementRecord) -> Result<bool> {
        let mut state = self.state.write().await;
        if !state.seen.insert(record.correlation_id) {
            return Ok(false);
        }
        state.totals.add(record.processor, record.amount);
        state.by_time.insert(
            (index_micros(record.settled_at), record.correlation_id),
            (record.processor, record.amount),
        );
        Ok(true)
    }

    async fn contains(&self, correlation_id: Uuid) -> Result<bool> {
        Ok(self.state.read().await.seen.contains(&correlation_id))
    }

    async fn get_summary(&self) -> Result<SummaryView> {
        Ok(self.state.read().await.totals.clone())
    }

    async fn get_summary_range(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<SummaryView> {
        let lower = match from {
            Some(t) => Bound::Included((bound_micros(t), Uuid::nil())),
            None => Bound::Unbounded,
        };
        let upper = match to {
            Some(t) => Bound::Excluded((bound_micros(t), Uuid::nil())),
            None => Bound::Unbounded,
        };

        let state = self.state.read().await;
        let mut view = SummaryView::default();
        if matches!((&lower, &upper), (Bound::Included(l), Bound::Excluded(u)) if l >= u) {
            return Ok(view);
        }
        for (processor, amount) in state.by_time.range((lower, upper)).map(|(_, v)| v) {
            view.add(*processor, *amount);
        }
        Ok(view)
    }

    async fn purge_all(&self) -> Result<()> {
        let mut state = self.state.write().await;
        *state = LedgerState::default();
        Ok(())
    }
}
