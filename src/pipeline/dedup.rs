//! TTL-bounded set of transaction hashes already emitted as a transfer event.
//!
//! Backed by `moka`, the same cache crate the event-indexer teacher uses for
//! its block-timestamp cache: time-based eviction keeps memory bounded
//! without an explicit cleanup task.

use std::time::Duration;

use moka::sync::Cache;

use crate::types::TxHash;

/// Shared across the block processor and the pending processor so a hash
/// admitted by one path is never re-emitted by the other.
#[derive(Clone)]
pub struct DedupSet {
    cache: Cache<TxHash, ()>,
}

impl DedupSet {
    /// Build a dedup set that evicts entries `retention` after insertion.
    #[must_use]
    pub fn new(retention: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(retention).build(),
        }
    }

    /// Whether `hash` has already been admitted.
    #[must_use]
    pub fn contains(&self, hash: &TxHash) -> bool {
        self.cache.contains_key(hash)
    }

    /// Atomically check-and-insert: returns `true` if `hash` was newly
    /// admitted (i.e. it was not already present).
    pub fn insert_if_absent(&self, hash: TxHash) -> bool {
        let mut inserted = false;
        self.cache.entry(hash).or_insert_with(|| {
            inserted = true;
        });
        inserted
    }

    /// Current number of entries, for observability.
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Whether the set is currently empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
