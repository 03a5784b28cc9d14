//! Property-based tests for the continuity engine's core invariants:
//! monotonic, gap-free coverage of every block number the engine is fed,
//! and case-insensitive address equality throughout the domain types.

mod common;

use std::sync::Arc;

use common::mock_rpc::MockRpcClient;
use proptest::prelude::*;
use transfer_sentinel::continuity::{BlockContinuityEngine, BlockSink};
use transfer_sentinel::types::{EthAddress, FetchedBlock};

use async_trait::async_trait;
use std::sync::Mutex;

struct CollectingSink {
    seen: Mutex<Vec<u64>>,
}

impl CollectingSink {
    fn new() -> Self {
        Self { seen: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl BlockSink for CollectingSink {
    async fn on_block(&self, block: FetchedBlock) {
        self.seen.lock().unwrap().push(block.number.get());
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap()
}

proptest! {
    /// Feeding any strictly ascending sequence of head numbers to the engine
    /// must result in the sink seeing every block from the initial head's
    /// successor to the final head, exactly once, in ascending order.
    #[test]
    fn continuity_engine_covers_every_block_monotonically(
        initial_head in 1u64..1000,
        deltas in proptest::collection::vec(1u64..5, 1..20),
    ) {
        let heads: Vec<u64> = deltas
            .iter()
            .scan(initial_head, |acc, d| {
                *acc += d;
                Some(*acc)
            })
            .collect();

        runtime().block_on(async {
            let client = Arc::new(MockRpcClient::new(initial_head));
            let final_head = *heads.last().unwrap();
            for n in (initial_head + 1)..=final_head {
                client.set_block_transactions(n, Vec::new());
            }

            let sink = Arc::new(CollectingSink::new());
            let engine = BlockContinuityEngine::new(
                client,
                Arc::clone(&sink) as Arc<dyn BlockSink>,
            );
            engine.initialize().await.unwrap();

            for head in &heads {
                engine.process_new_block(transfer_sentinel::types::BlockNumber::new(*head)).await.unwrap();
            }

            let seen = sink.seen.lock().unwrap().clone();
            let expected: Vec<u64> = ((initial_head + 1)..=final_head).collect();
            prop_assert_eq!(seen, expected);
            prop_assert_eq!(engine.last_processed().await.unwrap().get(), final_head);
        });
    }

    /// An address parsed from any mixed-case hex string equals the same
    /// address parsed from its lowercase or uppercase form.
    #[test]
    fn address_parsing_is_case_insensitive(bytes in proptest::array::uniform20(0u8..=255)) {
        let lower = format!("0x{}", hex::encode(bytes));
        let upper = format!("0x{}", hex::encode(bytes).to_uppercase());

        let a = EthAddress::from_hex(&lower).unwrap();
        let b = EthAddress::from_hex(&upper).unwrap();
        prop_assert_eq!(a, b);
        prop_assert_eq!(a.to_hex(), lower);
    }

    /// A gap fed directly to a fresh engine backfills exactly the missing
    /// range, never skipping or double-processing a block.
    #[test]
    fn gap_backfill_never_skips_or_duplicates(gap_size in 0u64..30) {
        runtime().block_on(async {
            let client = Arc::new(MockRpcClient::new(100));
            let target = 100 + gap_size + 1;
            for n in 101..=target {
                client.set_block_transactions(n, Vec::new());
            }

            let sink = Arc::new(CollectingSink::new());
            let engine = BlockContinuityEngine::new(client, Arc::clone(&sink) as Arc<dyn BlockSink>);
            engine.initialize().await.unwrap();
            engine.process_new_block(transfer_sentinel::types::BlockNumber::new(target)).await.unwrap();

            let seen = sink.seen.lock().unwrap().clone();
            let expected: Vec<u64> = (101..=target).collect();
            prop_assert_eq!(seen, expected);
        });
    }
}
