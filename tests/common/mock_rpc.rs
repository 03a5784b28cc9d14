//! A scriptable `StreamingRpcClient` for integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use transfer_sentinel::error::{CoreResult, NetworkError};
use transfer_sentinel::rpc::{HeadStream, PendingHashStream, StreamingRpcClient};
use transfer_sentinel::types::{BlockNumber, FetchedBlock, RawTransaction, TxHash};

/// A client whose responses are entirely controlled by the test.
///
/// Unset blocks come back as empty (no transactions) rather than `None`, so
/// tests only need to configure the blocks that matter.
#[derive(Default)]
pub struct MockRpcClient {
    head: AtomicU64,
    blocks: Mutex<HashMap<u64, FetchedBlock>>,
    fail_once: Mutex<HashSet<u64>>,
    transactions: Mutex<HashMap<TxHash, RawTransaction>>,
}

impl MockRpcClient {
    /// Build a client reporting `initial_head` as the current chain head.
    #[must_use]
    pub fn new(initial_head: u64) -> Self {
        Self {
            head: AtomicU64::new(initial_head),
            ..Self::default()
        }
    }

    /// Set the chain head returned by `block_number()`.
    pub fn set_head(&self, head: u64) {
        self.head.store(head, Ordering::SeqCst);
    }

    /// Configure the transactions returned for a specific block number.
    pub fn set_block_transactions(&self, number: u64, transactions: Vec<RawTransaction>) {
        self.blocks.lock().unwrap().insert(
            number,
            FetchedBlock {
                number: BlockNumber::new(number),
                transactions,
            },
        );
    }

    /// Make the next `get_block(number)` call fail exactly once.
    pub fn fail_block_once(&self, number: u64) {
        self.fail_once.lock().unwrap().insert(number);
    }

    /// Configure the transaction returned for `get_transaction(hash)`.
    pub fn set_transaction(&self, tx: RawTransaction) {
        self.transactions.lock().unwrap().insert(tx.hash, tx);
    }
}

#[async_trait]
impl StreamingRpcClient for MockRpcClient {
    async fn block_number(&self) -> CoreResult<u64> {
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn get_block(&self, number: u64) -> CoreResult<Option<FetchedBlock>> {
        if self.fail_once.lock().unwrap().remove(&number) {
            return Err(NetworkError::Closed("scripted failure".into()).into());
        }
        Ok(Some(self.blocks.lock().unwrap().get(&number).cloned().unwrap_or_else(|| FetchedBlock {
            number: BlockNumber::new(number),
            transactions: Vec::new(),
        })))
    }

    async fn get_transaction(&self, hash: TxHash) -> CoreResult<Option<RawTransaction>> {
        Ok(self.transactions.lock().unwrap().get(&hash).cloned())
    }

    async fn subscribe_new_heads(&self) -> CoreResult<HeadStream> {
        Ok(Box::pin(futures::stream::empty()))
    }

    async fn subscribe_pending_tx_hashes(&self) -> CoreResult<PendingHashStream> {
        Ok(Box::pin(futures::stream::empty()))
    }
}
