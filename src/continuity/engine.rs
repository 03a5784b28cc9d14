//! Tracks the high-water mark of processed blocks and drives sequential backfill.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument, warn};

use crate::error::CoreResult;
use crate::rpc::StreamingRpcClient;
use crate::types::{BlockNumber, FetchedBlock};

/// Receives every block the continuity engine decides to process, in
/// ascending order, whether it arrived in-order or via backfill.
#[async_trait]
pub trait BlockSink: Send + Sync {
    /// Handle one fetched block. Must not block; heavy work should be
    /// fanned out internally.
    async fn on_block(&self, block: FetchedBlock);
}

/// Outcome of [`BlockContinuityEngine::process_new_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// `n` was exactly `lastProcessed + 1`.
    InOrder,
    /// `n` was ahead of expected; `[from, to)` were backfilled before `n` itself.
    Backfilled {
        /// First backfilled block number (inclusive).
        from: BlockNumber,
        /// The newly processed head, `n` (inclusive upper bound of this call).
        to: BlockNumber,
    },
    /// `n <= lastProcessed`: duplicate or reorg echo, silently ignored.
    Stale,
}

/// Outcome of [`BlockContinuityEngine::handle_reconnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectOutcome {
    /// The engine had never been initialized; it is now.
    Initialized,
    /// The new tip was ahead; `[from, to]` were backfilled.
    Backfilled {
        /// First backfilled block number (inclusive).
        from: BlockNumber,
        /// New tip (inclusive).
        to: BlockNumber,
    },
    /// The new tip matched `lastProcessed` exactly.
    NoOp,
    /// The new tip trailed `lastProcessed`; a possible reorg was logged and
    /// the new node's tip was trusted.
    PossibleReorg {
        /// The new, lower, tip.
        new_tip: BlockNumber,
    },
}

struct State {
    last_processed: Option<BlockNumber>,
    initialized: bool,
    client: Arc<dyn StreamingRpcClient>,
}

/// Single-writer component guaranteeing every block in
/// `[first-observed, latest-observed]` is processed exactly once, in
/// ascending order, across disconnections and silent gaps.
///
/// Callers (the orchestrator) must serialize calls to this engine — funnel
/// all head notifications through one `mpsc` channel drained by one task.
/// The engine does not enforce this itself beyond the internal lock, which
/// exists for interior mutability, not for concurrency control.
pub struct BlockContinuityEngine {
    state: Mutex<State>,
    sink: Arc<dyn BlockSink>,
}

impl BlockContinuityEngine {
    /// Build a new engine over the given initial client and downstream sink.
    #[must_use]
    pub fn new(client: Arc<dyn StreamingRpcClient>, sink: Arc<dyn BlockSink>) -> Self {
        Self {
            state: Mutex::new(State {
                last_processed: None,
                initialized: false,
                client,
            }),
            sink,
        }
    }

    /// The current high-water mark, if initialized.
    pub async fn last_processed(&self) -> Option<BlockNumber> {
        self.state.lock().await.last_processed
    }

    /// Idempotent: on first call, set `lastProcessed` to the client's
    /// current head without processing it. Later calls are no-ops.
    ///
    /// # Errors
    /// Propagates `client.block_number()` failures.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> CoreResult<BlockNumber> {
        let mut state = self.state.lock().await;
        if state.initialized {
            return Ok(state.last_processed.unwrap_or(BlockNumber::new(0)));
        }

        let head = state.client.block_number().await?;
        let head = BlockNumber::new(head);
        state.last_processed = Some(head);
        state.initialized = true;
        debug!(head = head.get(), "continuity engine initialized");
        Ok(head)
    }

    /// Classify and process an observed head `n`.
    ///
    /// # Errors
    /// Propagates failure to fetch `n` itself — both when `n` arrives
    /// in-order and as the final block of a gap — so the caller can trigger
    /// pool failover. Backfill failures on intermediate blocks (strictly
    /// between `lastProcessed` and `n`) are logged and skipped instead, so
    /// the sequence never stalls on one bad block.
    #[instrument(skip(self))]
    pub async fn process_new_block(&self, n: BlockNumber) -> CoreResult<ProcessOutcome> {
        let mut state = self.state.lock().await;
        let last_processed = state
            .last_processed
            .expect("process_new_block called before initialize");
        let expected = last_processed.next();

        if n.get() <= last_processed.get() {
            debug!(n = n.get(), last_processed = last_processed.get(), "stale head ignored");
            return Ok(ProcessOutcome::Stale);
        }

        if n == expected {
            self.fetch_and_emit_propagating(&state.client, n).await?;
            state.last_processed = Some(n);
            return Ok(ProcessOutcome::InOrder);
        }

        let client = Arc::clone(&state.client);
        for k in expected.get()..n.get() {
            self.fetch_and_emit(&client, BlockNumber::new(k)).await;
            state.last_processed = Some(BlockNumber::new(k));
        }
        self.fetch_and_emit_propagating(&client, n).await?;
        state.last_processed = Some(n);

        metrics::counter!("sentinel_blocks_backfilled_total").increment(n.get() - expected.get() + 1);
        Ok(ProcessOutcome::Backfilled { from: expected, to: n })
    }

    /// Repoint the client after a reconnection and reconcile continuity.
    ///
    /// # Errors
    /// Propagates `new_client.block_number()` failures.
    #[instrument(skip(self, new_client))]
    pub async fn handle_reconnection(
        &self,
        new_client: Arc<dyn StreamingRpcClient>,
    ) -> CoreResult<ReconnectOutcome> {
        let mut state = self.state.lock().await;
        state.client = Arc::clone(&new_client);

        if !state.initialized {
            let head = new_client.block_number().await?;
            let head = BlockNumber::new(head);
            state.last_processed = Some(head);
            state.initialized = true;
            return Ok(ReconnectOutcome::Initialized);
        }

        let last_processed = state.last_processed.unwrap_or(BlockNumber::new(0));
        let latest = new_client.block_number().await?;
        let latest = BlockNumber::new(latest);

        match latest.get().cmp(&last_processed.get()) {
            std::cmp::Ordering::Greater => {
                let from = last_processed.next();
                for k in from.get()..=latest.get() {
                    self.fetch_and_emit(&new_client, BlockNumber::new(k)).await;
                }
                state.last_processed = Some(latest);
                Ok(ReconnectOutcome::Backfilled { from, to: latest })
            }
            std::cmp::Ordering::Equal => Ok(ReconnectOutcome::NoOp),
            std::cmp::Ordering::Less => {
                warn!(
                    new_tip = latest.get(),
                    last_processed = last_processed.get(),
                    "possible reorg: new node's tip trails last processed block"
                );
                state.last_processed = Some(latest);
                Ok(ReconnectOutcome::PossibleReorg { new_tip: latest })
            }
        }
    }

    /// Fetch block `n` and hand it to the sink; backfill path, a fetch
    /// failure is logged and skipped rather than propagated.
    async fn fetch_and_emit(&self, client: &Arc<dyn StreamingRpcClient>, n: BlockNumber) {
        match client.get_block(n.get()).await {
            Ok(Some(block)) => self.sink.on_block(block).await,
            Ok(None) => error!(block = n.get(), "block vanished between head notice and fetch"),
            Err(e) => error!(block = n.get(), error = ?e, "backfill block fetch failed, skipping"),
        }
    }

    /// Fetch block `n` and hand it to the sink; routine path, a fetch
    /// failure is propagated to the caller instead of being swallowed.
    async fn fetch_and_emit_propagating(&self, client: &Arc<dyn StreamingRpcClient>, n: BlockNumber) -> CoreResult<()> {
        match client.get_block(n.get()).await? {
            Some(block) => self.sink.on_block(block).await,
            None => error!(block = n.get(), "block vanished between head notice and fetch"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::Mutex as TokioMutex;

    use crate::rpc::{HeadStream, PendingHashStream};
    use crate::types::{RawTransaction, TxHash};

    #[derive(Default)]
    struct MockClient {
        head: AtomicU64,
        fail_once: std::sync::Mutex<Option<u64>>,
    }

    #[async_trait]
    impl StreamingRpcClient for MockClient {
        async fn block_number(&self) -> CoreResult<u64> {
            Ok(self.head.load(Ordering::SeqCst))
        }

        async fn get_block(&self, number: u64) -> CoreResult<Option<FetchedBlock>> {
            let mut fail_once = self.fail_once.lock().unwrap();
            if *fail_once == Some(number) {
                *fail_once = None;
                return Err(crate::error::NetworkError::Closed("boom".into()).into());
            }
            Ok(Some(FetchedBlock {
                number: BlockNumber::new(number),
                transactions: Vec::new(),
            }))
        }

        async fn get_transaction(&self, _hash: TxHash) -> CoreResult<Option<RawTransaction>> {
            Ok(None)
        }

        async fn subscribe_new_heads(&self) -> CoreResult<HeadStream> {
            Ok(Box::pin(futures::stream::empty()))
        }

        async fn subscribe_pending_tx_hashes(&self) -> CoreResult<PendingHashStream> {
            Ok(Box::pin(futures::stream::empty()))
        }
    }

    struct RecordingSink {
        seen: TokioMutex<Vec<u64>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                seen: TokioMutex::new(Vec::new()),
            }
        }

        async fn seen(&self) -> Vec<u64> {
            self.seen.lock().await.clone()
        }
    }

    #[async_trait]
    impl BlockSink for RecordingSink {
        async fn on_block(&self, block: FetchedBlock) {
            self.seen.lock().await.push(block.number.get());
        }
    }

    #[tokio::test]
    async fn initialize_sets_high_water_mark_without_processing() {
        let client = Arc::new(MockClient {
            head: AtomicU64::new(100),
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::new());
        let engine = BlockContinuityEngine::new(client, Arc::clone(&sink) as Arc<dyn BlockSink>);

        let head = engine.initialize().await.unwrap();
        assert_eq!(head.get(), 100);
        assert!(sink.seen().await.is_empty());
    }

    #[tokio::test]
    async fn in_order_block_advances_by_one() {
        let client = Arc::new(MockClient {
            head: AtomicU64::new(100),
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::new());
        let engine = BlockContinuityEngine::new(client, Arc::clone(&sink) as Arc<dyn BlockSink>);
        engine.initialize().await.unwrap();

        let outcome = engine.process_new_block(BlockNumber::new(101)).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::InOrder);
        assert_eq!(engine.last_processed().await, Some(BlockNumber::new(101)));
        assert_eq!(sink.seen().await, vec![101]);
    }

    #[tokio::test]
    async fn gap_backfills_intermediate_blocks_in_order() {
        let client = Arc::new(MockClient {
            head: AtomicU64::new(100),
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::new());
        let engine = BlockContinuityEngine::new(client, Arc::clone(&sink) as Arc<dyn BlockSink>);
        engine.initialize().await.unwrap();

        engine.process_new_block(BlockNumber::new(101)).await.unwrap();
        let outcome = engine.process_new_block(BlockNumber::new(105)).await.unwrap();

        assert_eq!(
            outcome,
            ProcessOutcome::Backfilled {
                from: BlockNumber::new(102),
                to: BlockNumber::new(105)
            }
        );
        assert_eq!(sink.seen().await, vec![101, 102, 103, 104, 105]);
        assert_eq!(engine.last_processed().await, Some(BlockNumber::new(105)));
    }

    #[tokio::test]
    async fn backfill_error_is_skipped_without_stalling() {
        let client = Arc::new(MockClient {
            head: AtomicU64::new(100),
            fail_once: std::sync::Mutex::new(Some(103)),
        });
        let sink = Arc::new(RecordingSink::new());
        let engine = BlockContinuityEngine::new(client, Arc::clone(&sink) as Arc<dyn BlockSink>);
        engine.initialize().await.unwrap();

        engine.process_new_block(BlockNumber::new(101)).await.unwrap();
        engine.process_new_block(BlockNumber::new(105)).await.unwrap();

        assert_eq!(sink.seen().await, vec![101, 102, 104, 105]);
        assert_eq!(engine.last_processed().await, Some(BlockNumber::new(105)));
    }

    #[tokio::test]
    async fn in_order_fetch_failure_propagates_and_does_not_advance() {
        let client = Arc::new(MockClient {
            head: AtomicU64::new(100),
            fail_once: std::sync::Mutex::new(Some(101)),
        });
        let sink = Arc::new(RecordingSink::new());
        let engine = BlockContinuityEngine::new(client, Arc::clone(&sink) as Arc<dyn BlockSink>);
        engine.initialize().await.unwrap();

        let err = engine.process_new_block(BlockNumber::new(101)).await;
        assert!(err.is_err());
        assert!(sink.seen().await.is_empty());
        assert_eq!(engine.last_processed().await, Some(BlockNumber::new(100)));
    }

    #[tokio::test]
    async fn gap_final_block_fetch_failure_propagates_after_backfilling_intermediates() {
        let client = Arc::new(MockClient {
            head: AtomicU64::new(100),
            fail_once: std::sync::Mutex::new(Some(105)),
        });
        let sink = Arc::new(RecordingSink::new());
        let engine = BlockContinuityEngine::new(client, Arc::clone(&sink) as Arc<dyn BlockSink>);
        engine.initialize().await.unwrap();
        engine.process_new_block(BlockNumber::new(101)).await.unwrap();

        let err = engine.process_new_block(BlockNumber::new(105)).await;
        assert!(err.is_err());
        assert_eq!(sink.seen().await, vec![101, 102, 103, 104]);
        assert_eq!(engine.last_processed().await, Some(BlockNumber::new(104)));
    }

    #[tokio::test]
    async fn stale_block_is_ignored() {
        let client = Arc::new(MockClient {
            head: AtomicU64::new(100),
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::new());
        let engine = BlockContinuityEngine::new(client, Arc::clone(&sink) as Arc<dyn BlockSink>);
        engine.initialize().await.unwrap();
        engine.process_new_block(BlockNumber::new(101)).await.unwrap();

        let outcome = engine.process_new_block(BlockNumber::new(101)).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::Stale);
        assert_eq!(sink.seen().await, vec![101]);
    }

    #[tokio::test]
    async fn reconnection_backfills_to_new_tip() {
        let client = Arc::new(MockClient {
            head: AtomicU64::new(100),
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::new());
        let engine = BlockContinuityEngine::new(client, Arc::clone(&sink) as Arc<dyn BlockSink>);
        engine.initialize().await.unwrap();
        engine.process_new_block(BlockNumber::new(101)).await.unwrap();
        engine.process_new_block(BlockNumber::new(102)).await.unwrap();

        let new_client: Arc<dyn StreamingRpcClient> = Arc::new(MockClient {
            head: AtomicU64::new(106),
            ..Default::default()
        });
        let outcome = engine.handle_reconnection(Arc::clone(&new_client)).await.unwrap();

        assert_eq!(
            outcome,
            ReconnectOutcome::Backfilled {
                from: BlockNumber::new(103),
                to: BlockNumber::new(106)
            }
        );
        assert_eq!(sink.seen().await, vec![101, 102, 103, 104, 105, 106]);
        assert_eq!(engine.last_processed().await, Some(BlockNumber::new(106)));
    }

    #[tokio::test]
    async fn reconnection_with_lower_tip_logs_reorg_and_trusts_new_tip() {
        let client = Arc::new(MockClient {
            head: AtomicU64::new(100),
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::new());
        let engine = BlockContinuityEngine::new(client, Arc::clone(&sink) as Arc<dyn BlockSink>);
        engine.initialize().await.unwrap();
        engine.process_new_block(BlockNumber::new(101)).await.unwrap();
        engine.process_new_block(BlockNumber::new(102)).await.unwrap();

        let new_client: Arc<dyn StreamingRpcClient> = Arc::new(MockClient {
            head: AtomicU64::new(99),
            ..Default::default()
        });
        let outcome = engine.handle_reconnection(new_client).await.unwrap();

        assert_eq!(outcome, ReconnectOutcome::PossibleReorg { new_tip: BlockNumber::new(99) });
        assert_eq!(engine.last_processed().await, Some(BlockNumber::new(99)));
    }
}
