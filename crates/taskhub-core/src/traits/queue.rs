//! Queue backend trait for pluggable durable storage.

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for queue storage backends (in-memory, database, Redis, ...).
///
/// Entries are opaque strings; (de)serialization of jobs belongs to the
/// layer above. Backends own an entry exclusively while it is enqueued and
/// hand over exclusive ownership on `pop`.
#[async_trait]
pub trait QueueBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Push an entry onto the named queue.
    ///
    /// `delay_seconds` defers visibility of the entry by at least that many
    /// seconds. Backends that cannot defer may round down to zero; that is a
    /// documented degradation, not an error.
    async fn push(&self, queue: &str, entry: &str, delay_seconds: u64) -> AppResult<()>;

    /// Pop the next visible entry from the named queue, or `None` when the
    /// queue is empty.
    ///
    /// Must be atomic with respect to other concurrent `pop` calls on the
    /// same queue name: two workers must never receive the same entry. The
    /// entry is removed from the queue; a backend that only peeks must
    /// provide its own discard for undeliverable entries.
    async fn pop(&self, queue: &str) -> AppResult<Option<String>>;

    /// Number of entries currently stored in the named queue, including
    /// entries whose visibility delay has not yet elapsed.
    async fn size(&self, queue: &str) -> AppResult<u64>;

    /// Remove all entries from the named queue.
    async fn clear(&self, queue: &str) -> AppResult<()>;
}
