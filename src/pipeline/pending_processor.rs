//! Mempool (pending transaction) admission over a hash stream (component E).

use std::sync::Arc;

use futures::stream::{Stream, StreamExt};
use tracing::debug;

use crate::config::Config;
use crate::error::{CoreError, NetworkError};
use crate::ports::{Clock, Sink};
use crate::rpc::StreamingRpcClient;
use crate::types::{TransferKind, TxHash};

use super::dedup::DedupSet;
use super::filter::{build_event, should_process};

const MAX_CONCURRENT_LOOKUPS: usize = 16;

/// Drives a pending-transaction-hash stream to completion, fanning out
/// concurrent `GetTransaction` lookups for each newly seen hash.
pub struct PendingProcessor {
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
    dedup: DedupSet,
    sink: Arc<dyn Sink>,
    client: Arc<dyn StreamingRpcClient>,
}

impl PendingProcessor {
    /// Build a pending processor over the given config, clock, shared dedup
    /// set, sink, and the client to resolve hashes against.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        clock: Arc<dyn Clock>,
        dedup: DedupSet,
        sink: Arc<dyn Sink>,
        client: Arc<dyn StreamingRpcClient>,
    ) -> Self {
        Self { config, clock, dedup, sink, client }
    }

    /// Drain `hashes` to completion, processing admitted entries concurrently.
    /// Returns once the stream ends (disconnect or unsubscribe).
    pub async fn run(&self, hashes: impl Stream<Item = TxHash>) {
        hashes
            .for_each_concurrent(MAX_CONCURRENT_LOOKUPS, |hash| async move {
                self.process_one(hash).await;
            })
            .await;
    }

    async fn process_one(&self, hash: TxHash) {
        if self.dedup.contains(&hash) {
            return;
        }

        let tx = match self.client.get_transaction(hash).await {
            Ok(Some(tx)) => tx,
            Ok(None) => return,
            Err(CoreError::Network(NetworkError::Timeout(_) | NetworkError::Closed(_))) => {
                debug!(%hash, "pending transaction lookup timed out or connection closed, swallowing");
                return;
            }
            Err(e) => {
                debug!(%hash, error = ?e, "pending transaction lookup failed, swallowing");
                return;
            }
        };

        let Some(watched_side) = should_process(&self.config, tx.from, tx.to, tx.value) else {
            return;
        };
        let to = tx.to.expect("should_process guarantees a recipient");

        if !self.dedup.insert_if_absent(hash) {
            return;
        }

        let event = build_event(&self.config, self.clock.as_ref(), TransferKind::Pending, &tx, to, watched_side);
        metrics::counter!("sentinel_transfer_events_total", "kind" => "pending").increment(1);
        self.sink.emit(&event);
    }
}
