//! In-memory queue backend.
//!
//! Reference implementation of [`QueueBackend`] for tests and single-process
//! deployments. A single mutex over all queues makes `pop` atomic with
//! respect to concurrent pops, which is the exclusivity contract workers
//! rely on. Visibility delays are supported per entry.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use taskhub_core::result::AppResult;
use taskhub_core::traits::queue::QueueBackend;

/// One stored entry with its visibility time.
#[derive(Debug)]
struct QueuedEntry {
    /// The entry becomes eligible for `pop` at this instant.
    visible_at: DateTime<Utc>,
    /// Opaque serialized payload.
    entry: String,
}

/// In-memory queue backend keyed by queue name.
#[derive(Debug, Default)]
pub struct MemoryQueueBackend {
    queues: Mutex<HashMap<String, VecDeque<QueuedEntry>>>,
}

impl MemoryQueueBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueBackend for MemoryQueueBackend {
    async fn push(&self, queue: &str, entry: &str, delay_seconds: u64) -> AppResult<()> {
        let visible_at = Utc::now() + Duration::seconds(delay_seconds as i64);
        let mut queues = self.queues.lock().await;
        queues
            .entry(queue.to_string())
            .or_default()
            .push_back(QueuedEntry {
                visible_at,
                entry: entry.to_string(),
            });
        Ok(())
    }

    async fn pop(&self, queue: &str) -> AppResult<Option<String>> {
        let now = Utc::now();
        let mut queues = self.queues.lock().await;
        let Some(entries) = queues.get_mut(queue) else {
            return Ok(None);
        };

        // First entry whose visibility delay has elapsed, FIFO otherwise.
        let position = entries.iter().position(|e| e.visible_at <= now);
        Ok(position
            .and_then(|idx| entries.remove(idx))
            .map(|e| e.entry))
    }

    async fn size(&self, queue: &str) -> AppResult<u64> {
        let queues = self.queues.lock().await;
        Ok(queues.get(queue).map_or(0, |entries| entries.len() as u64))
    }

    async fn clear(&self, queue: &str) -> AppResult<()> {
        let mut queues = self.queues.lock().await;
        queues.remove(queue);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_push_pop_fifo() {
        let backend = MemoryQueueBackend::new();
        backend.push("default", "first", 0).await.unwrap();
        backend.push("default", "second", 0).await.unwrap();

        assert_eq!(
            backend.pop("default").await.unwrap(),
            Some("first".to_string())
        );
        assert_eq!(
            backend.pop("default").await.unwrap(),
            Some("second".to_string())
        );
        assert_eq!(backend.pop("default").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pop_empty_queue() {
        let backend = MemoryQueueBackend::new();
        assert_eq!(backend.pop("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delayed_entry_not_visible() {
        let backend = MemoryQueueBackend::new();
        backend.push("default", "later", 3600).await.unwrap();
        backend.push("default", "now", 0).await.unwrap();

        // The delayed entry is skipped, not blocking the visible one.
        assert_eq!(
            backend.pop("default").await.unwrap(),
            Some("now".to_string())
        );
        assert_eq!(backend.pop("default").await.unwrap(), None);
        assert_eq!(backend.size("default").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_size_and_clear() {
        let backend = MemoryQueueBackend::new();
        backend.push("reports", "a", 0).await.unwrap();
        backend.push("reports", "b", 0).await.unwrap();
        assert_eq!(backend.size("reports").await.unwrap(), 2);

        backend.clear("reports").await.unwrap();
        assert_eq!(backend.size("reports").await.unwrap(), 0);
        assert_eq!(backend.pop("reports").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_queues_are_isolated() {
        let backend = MemoryQueueBackend::new();
        backend.push("a", "entry-a", 0).await.unwrap();
        backend.push("b", "entry-b", 0).await.unwrap();

        assert_eq!(backend.pop("b").await.unwrap(), Some("entry-b".to_string()));
        assert_eq!(backend.size("a").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_pops_never_duplicate() {
        let backend = Arc::new(MemoryQueueBackend::new());
        for i in 0..100 {
            backend
                .push("default", &format!("entry-{i}"), 0)
                .await
                .unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..8 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(entry) = backend.pop("default").await.unwrap() {
                    seen.push(entry);
                }
                seen
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }

        all.sort();
        all.dedup();
        assert_eq!(all.len(), 100);
    }
}
