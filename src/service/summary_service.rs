use crate::domain::summary::SummaryView;
use crate::ledger::LedgerStore;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("invalid summary range: {0}")]
    InvalidRange(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct SummaryService {
    pub ledger: Arc<dyn LedgerStore>,
}

impl SummaryService {
    pub async fn get_summary(&self) -> Result<SummaryView, SummaryError> {
        Ok(self.ledger.get_summary().await?)
    }

    pub async fn get_summary_with_time(&self, from: Option<&str>, to: Option<&str>) -> Result<SummaryView, SummaryError> {
        let (from, to) = parse_range(from, to)?;
        Ok(self.ledger.get_summary_range(from, to).await?)
    }

    pub async fn purge_all_data(&self) -> anyhow::Result<()> {
        self.ledger.purge_all().await?;
        tracing::info!("ledger purged");
        Ok(())
    }
}

/// Empty or missing bounds are unbounded. Both present requires `from <= to`.
pub fn parse_range(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), SummaryError> {
    let from = parse_bound("from", from)?;
    let to = parse_bound("to", to)?;
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(SummaryError::InvalidRange(format!("from ({f}) is after to ({t})")));
        }
    }
    Ok((from, to))
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, SummaryError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(s) => s,
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    // Timestamps without an offset are taken as UTC.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| SummaryError::InvalidRange(format!("{name} is not a valid timestamp: {raw}")))
}
