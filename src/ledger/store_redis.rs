use crate::domain::payment::{from_minor_units, to_minor_units, Processor, SettlementRecord};
use crate::domain::summary::SummaryView;
use crate::ledger::{bound_micros, index_micros, LedgerStore};
use anyhow::Result;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use uuid::Uuid;

const SEEN_KEY: &str = "payments:ledger:seen";
const TOTALS_KEY: &str = "payments:ledger:totals";

// KEYS: seen set, totals hash, per-processor time index.
// ARGV: correlation id, processor, amount in minor units, settled_at epoch micros, index member.
const INSERT_SCRIPT: &str = r#"
if redis.call("SADD", KEYS[1], ARGV[1]) == 0 then
    return 0
end
redis.call("HINCRBY", KEYS[2], ARGV[2] .. ":count", 1)
redis.call("HINCRBY", KEYS[2], ARGV[2] .. ":amount_minor", ARGV[3])
redis.call("ZADD", KEYS[3], ARGV[4], ARGV[5])
return 1
"#;

#[derive(Clone)]
pub struct RedisLedger {
    conn: ConnectionManager,
    insert_script: redis::Script,
}

impl RedisLedger {
    pub async fn new(client: redis::Client) -> Result<Self> {
        Ok(Self {
            conn: ConnectionManager::new(client).await?,
            insert_script: redis::Script::new(INSERT_SCRIPT),
        })
    }

    pub fn records_key(processor: Processor) -> String {
        format!("payments:ledger:records:{}", processor.as_str())
    }

    pub fn index_member(correlation_id: Uuid, amount_minor: i64) -> String {
        format!("{}:{}", correlation_id, amount_minor)
    }

    fn totals_from_hash(values: &HashMap<String, i64>) -> SummaryView {
        let mut view = SummaryView::default();
        for processor in Processor::ALL {
            let count = values
                .get(&format!("{}:count", processor.as_str()))
                .copied()
                .unwrap_or(0);
            let amount_minor = values
                .get(&format!("{}:amount_minor", processor.as_str()))
                .copied()
                .unwrap_or(0);
            let entry = view.get_mut(processor);
            entry.count = count.max(0) as u64;
            entry.total_amount = from_minor_units(amount_minor);
        }
        view
    }
}

fn member_amount_minor(member: &str) -> Option<i64> {
    member.rsplit_once(':').and_then(|(_, amount)| amount.parse::<i64>().ok())
}

fn score_bounds(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> (String, String) {
    let min = from
        .map(|t| bound_micros(t).to_string())
        .unwrap_or_else(|| "-inf".to_string());
    let max = to
        .map(|t| format!("({}", bound_micros(t)))
        .unwrap_or_else(|| "+inf".to_string());
    (min, max)
}

#[async_trait::async_trait]
impl LedgerStore for RedisLedger {
    async fn insert(&self, record: &SettlementRecord) -> Result<bool> {
        let mut conn = self.conn.clone();
        let amount_minor = to_minor_units(record.amount)?;
        let inserted: i32 = self
            .insert_script
            .key(SEEN_KEY)
            .key(TOTALS_KEY)
            .key(Self::records_key(record.processor))
            .arg(record.correlation_id.to_string())
            .arg(record.processor.as_str())
            .arg(amount_minor)
            .arg(index_micros(record.settled_at))
            .arg(Self::index_member(record.correlation_id, amount_minor))
            .invoke_async(&mut conn)
            .await?;
        Ok(inserted == 1)
    }

    async fn contains(&self, correlation_id: Uuid) -> Result<bool> {
        let mut conn = self.conn.clone();
        let found: bool = conn.sismember(SEEN_KEY, correlation_id.to_string()).await?;
        Ok(found)
    }

    async fn get_summary(&self) -> Result<SummaryView> {
        let mut conn = self.conn.clone();
        let values: HashMap<String, i64> = conn.hgetall(TOTALS_KEY).await?;
        Ok(Self::totals_from_hash(&values))
    }

    async fn get_summary_range(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<SummaryView> {
        let mut view = SummaryView::default();
        if let (Some(f), Some(t)) = (from, to) {
            if f >= t {
                return Ok(view);
            }
        }

        let (min, max) = score_bounds(from, to);
        let mut conn = self.conn.clone();
        let (default_members, fallback_members): (Vec<String>, Vec<String>) = redis::pipe()
            .atomic()
            .cmd("ZRANGEBYSCORE")
            .arg(Self::records_key(Processor::Default))
            .arg(&min)
            .arg(&max)
            .cmd("ZRANGEBYSCORE")
            .arg(Self::records_key(Processor::Fallback))
            .arg(&min)
            .arg(&max)
            .query_async(&mut conn)
            .await?;

        for (processor, members) in [
            (Processor::Default, default_members),
            (Processor::Fallback, fallback_members),
        ] {
            for member in members {
                match member_amount_minor(&member) {
                    Some(minor) => view.add(processor, from_minor_units(minor)),
                    None => tracing::warn!(processor = %processor, member = %member, "unparseable ledger index member"),
                }
            }
        }
        Ok(view)
    }

    async fn purge_all(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let keys = vec![
            SEEN_KEY.to_string(),
            TOTALS_KEY.to_string(),
            Self::records_key(Processor::Default),
            Self::records_key(Processor::Fallback),
        ];
        let _: usize = conn.del(keys).await?;
        Ok(())
    }
}
