use crate::queue::{DeadLetter, PaymentQueue, DEAD_LETTER_KEY, QUEUE_KEY};
use anyhow::Result;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::AsyncCommands;
use std::time::Duration;
use tokio::sync::Mutex;

/// `LPUSH` on the producer side, `BRPOP` on the consumer side.
pub struct RedisPaymentQueue {
    client: redis::Client,
    conn: ConnectionManager,
    // BRPOP parks the connection it runs on, so each blocked popper needs its own.
    idle_blocking: Mutex<Vec<MultiplexedConnection>>,
    queue_key: String,
    dead_letter_key: String,
}

impl RedisPaymentQueue {
    pub async fn new(client: redis::Client) -> Result<Self> {
        let conn = ConnectionManager::new(client.clone()).await?;
        Ok(Self {
            client,
            conn,
            idle_blocking: Mutex::new(Vec::new()),
            queue_key: QUEUE_KEY.to_string(),
            dead_letter_key: DEAD_LETTER_KEY.to_string(),
        })
    }

    async fn checkout(&self) -> Result<MultiplexedConnection> {
        if let Some(conn) = self.idle_blocking.lock().await.pop() {
            return Ok(conn);
        }
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    async fn checkin(&self, conn: MultiplexedConnection) {
        self.idle_blocking.lock().await.push(conn);
    }
}

#[async_trait::async_trait]
impl PaymentQueue for RedisPaymentQueue {
    async fn push(&self, payload: String) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: usize = conn.lpush(&self.queue_key, payload).await?;
        Ok(())
    }

    async fn pop(&self, wait: Duration) -> Result<Option<String>> {
        let mut conn = self.checkout().await?;
        let popped: redis::RedisResult<Option<(String, String)>> = redis::cmd("BRPOP")
            .arg(&self.queue_key)
            .arg(wait.as_secs_f64())
            .query_async(&mut conn)
            .await;

        match popped {
            Ok(item) => {
                self.checkin(conn).await;
                Ok(item.map(|(_, payload)| payload))
            }
            // A broken connection is dropped instead of returned to the pool.
            Err(e) => Err(e.into()),
        }
    }

    async fn dead_letter(&self, entry: DeadLetter) -> Result<()> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(&entry)?;
        let _: usize = conn.lpush(&self.dead_letter_key, payload).await?;
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        let n: usize = conn.llen(&self.queue_key).await?;
        Ok(n)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
