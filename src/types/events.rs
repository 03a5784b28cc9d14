//! The single event type emitted by the detection pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{TransferKind, WatchedSide};
use super::primitives::{BlockNumber, EthAddress, TxHash, WeiAmount};

/// A watch-list transfer observed either in the mempool or in a confirmed block.
///
/// Exactly one `TransferEvent` is ever emitted per transaction hash: if the
/// hash is first seen pending, the later confirmed sighting is suppressed by
/// the shared dedup set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Pending or confirmed.
    pub kind: TransferKind,
    /// The transaction hash.
    pub tx_hash: TxHash,
    /// Sender address.
    pub from: EthAddress,
    /// Recipient address.
    pub to: EthAddress,
    /// Sender's configured label, if any.
    pub from_label: Option<String>,
    /// Recipient's configured label, if any.
    pub to_label: Option<String>,
    /// Exact transfer value in wei.
    pub value_wei: WeiAmount,
    /// Containing block number; absent for pending events.
    pub block_number: Option<BlockNumber>,
    /// Which watch-listed side(s) this transfer touches.
    pub watched_side: WatchedSide,
    /// True iff this event is the Pending emission for its hash.
    pub seen_in_mempool: bool,
    /// Wall-clock time of detection.
    pub timestamp: DateTime<Utc>,
}

impl TransferEvent {
    /// Render the value as a decimal ETH string, for display purposes.
    #[must_use]
    pub fn value_eth(&self) -> String {
        self.value_wei.to_eth_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::primitives::TxHash as TxHashType;
    use alloy::primitives::B256;

    fn sample_event(kind: TransferKind) -> TransferEvent {
        TransferEvent {
            kind,
            tx_hash: TxHashType::new(B256::ZERO),
            from: EthAddress::ZERO,
            to: EthAddress::ZERO,
            from_label: Some("exchange-hot-wallet".into()),
            to_label: None,
            value_wei: WeiAmount::from_eth_str("150").unwrap(),
            block_number: match kind {
                TransferKind::Confirmed => Some(BlockNumber::new(100)),
                TransferKind::Pending => None,
            },
            watched_side: WatchedSide::From,
            seen_in_mempool: matches!(kind, TransferKind::Pending),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn pending_event_has_no_block_number() {
        let event = sample_event(TransferKind::Pending);
        assert!(event.block_number.is_none());
        assert!(event.seen_in_mempool);
    }

    #[test]
    fn confirmed_event_has_block_number() {
        let event = sample_event(TransferKind::Confirmed);
        assert_eq!(event.block_number, Some(BlockNumber::new(100)));
        assert!(!event.seen_in_mempool);
    }

    #[test]
    fn value_eth_matches_wei_amount() {
        let event = sample_event(TransferKind::Confirmed);
        assert_eq!(event.value_eth(), "150");
    }
}
