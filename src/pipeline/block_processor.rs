//! Per-transaction admission over a fully fetched block (component D).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::continuity::BlockSink;
use crate::ports::{Clock, Sink};
use crate::types::{FetchedBlock, TransferKind};

use super::dedup::DedupSet;
use super::filter::{build_event, should_process};

/// Implements [`BlockSink`]: the continuity engine hands every block it
/// decides to process here, in order, whether in-order or backfilled.
pub struct BlockProcessor {
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
    dedup: DedupSet,
    sink: Arc<dyn Sink>,
}

impl BlockProcessor {
    /// Build a processor over the given config, clock, shared dedup set, and sink.
    #[must_use]
    pub fn new(config: Arc<Config>, clock: Arc<dyn Clock>, dedup: DedupSet, sink: Arc<dyn Sink>) -> Self {
        Self { config, clock, dedup, sink }
    }
}

#[async_trait]
impl BlockSink for BlockProcessor {
    async fn on_block(&self, block: FetchedBlock) {
        if block.transactions.is_empty() {
            return;
        }

        for tx in &block.transactions {
            if self.dedup.contains(&tx.hash) {
                debug!(hash = %tx.hash, "already emitted as pending, skipping confirmed sighting");
                continue;
            }

            let Some(watched_side) = should_process(&self.config, tx.from, tx.to, tx.value) else {
                continue;
            };
            let to = tx.to.expect("should_process guarantees a recipient");

            if !self.dedup.insert_if_absent(tx.hash) {
                continue;
            }

            let event = build_event(&self.config, self.clock.as_ref(), TransferKind::Confirmed, tx, to, watched_side);
            metrics::counter!("sentinel_transfer_events_total", "kind" => "confirmed").increment(1);
            self.sink.emit(&event);
        }
    }
}
