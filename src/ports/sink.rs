//! Sink port: where detected transfers go.
//!
//! A sink is synchronous and infallible by contract — emitting a transfer is
//! local formatting/output, never a network call, so there is nothing to
//! retry or propagate. Implementations that need async delivery should buffer
//! internally and flush on their own schedule.

use crate::types::TransferEvent;

/// Receives detected transfers as they're produced by the pipeline.
pub trait Sink: Send + Sync {
    /// Emit one transfer event.
    fn emit(&self, event: &TransferEvent);
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks {
    //! Mock sink for testing.

    use std::sync::Mutex;

    use super::Sink;
    use crate::types::TransferEvent;

    /// Sink that records every event it receives, in order.
    #[derive(Debug, Default)]
    pub struct MockSink {
        events: Mutex<Vec<TransferEvent>>,
    }

    impl MockSink {
        /// Create an empty mock sink.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of events recorded so far.
        #[must_use]
        pub fn count(&self) -> usize {
            self.events.lock().expect("mock sink mutex poisoned").len()
        }

        /// Clone of all events recorded so far, in emission order.
        #[must_use]
        pub fn events(&self) -> Vec<TransferEvent> {
            self.events.lock().expect("mock sink mutex poisoned").clone()
        }
    }

    impl Sink for MockSink {
        fn emit(&self, event: &TransferEvent) {
            self.events
                .lock()
                .expect("mock sink mutex poisoned")
                .push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::MockSink;
    use super::*;
    use crate::types::{EthAddress, TransferKind, TxHash, WatchedSide, WeiAmount};
    use alloy::primitives::B256;
    use chrono::Utc;

    fn sample_event() -> TransferEvent {
        TransferEvent {
            kind: TransferKind::Confirmed,
            tx_hash: TxHash::new(B256::ZERO),
            from: EthAddress::ZERO,
            to: EthAddress::ZERO,
            from_label: None,
            to_label: None,
            value_wei: WeiAmount::ZERO,
            block_number: None,
            watched_side: WatchedSide::Both,
            seen_in_mempool: false,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn mock_sink_records_events_in_order() {
        let sink = MockSink::new();
        sink.emit(&sample_event());
        sink.emit(&sample_event());
        assert_eq!(sink.count(), 2);
        assert_eq!(sink.events().len(), 2);
    }
}
