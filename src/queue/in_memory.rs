use crate::queue::{DeadLetter, PaymentQueue};
use anyhow::Result;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

#[derive(Default)]
pub struct InMemoryQueue {
    items: Mutex<VecDeque<String>>,
    dead_letters: Mutex<Vec<DeadLetter>>,
    notify: Notify,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl PaymentQueue for InMemoryQueue {
    async fn push(&self, payload: String) -> Result<()> {
        self.items.lock().await.push_back(payload);
        self.notify.notify_one();
        Ok(())
    }

    async fn pop(&self, wait: Duration) -> Result<Option<String>> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            if let Some(item) = self.items.lock().await.pop_front() {
                return Ok(Some(item));
            }
            if tokio::time::timeout_at(deadline, self.notify.notified()).await.is_err() {
                return Ok(self.items.lock().await.pop_front());
            }
        }
    }

    async fn dead_letter(&self, entry: DeadLetter) -> Result<()> {
        self.dead_letters.lock().await.push(entry);
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.items.lock().await.len())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn pops_in_fifo_order() {
        let q = InMemoryQueue::new();
        q.push("a".to_string()).await.unwrap();
        q.push("b".to_string()).await.unwrap();
        assert_eq!(q.pop(Duration::from_millis(10)).await.unwrap().as_deref(), Some("a"));
        assert_eq!(q.pop(Duration::from_millis(10)).await.unwrap().as_deref(), Some("b"));
        assert_eq!(q.pop(Duration::from_millis(10)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn blocked_pop_wakes_on_push() {
        let q = Arc::new(InMemoryQueue::new());
        let popper = {
            let q = q.clone();
            tokio::spawn(async move { q.pop(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        q.push("late".to_string()).await.unwrap();
        assert_eq!(popper.await.unwrap().unwrap().as_deref(), Some("late"));
    }
}
