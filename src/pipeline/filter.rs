//! The admission filter shared by the block processor and the pending processor.

use crate::config::Config;
use crate::ports::Clock;
use crate::types::{EthAddress, RawTransaction, TransferEvent, TransferKind, WatchedSide, WeiAmount};

/// Decide whether `tx` clears the threshold and touches the watch-list.
///
/// Returns the watched side if admitted, `None` otherwise. A transaction
/// with no recipient (contract creation) is never admitted.
#[must_use]
pub fn should_process(config: &Config, from: EthAddress, to: Option<EthAddress>, value: WeiAmount) -> Option<WatchedSide> {
    let to = to?;
    if value < config.threshold {
        return None;
    }
    let from_watched = config.watched.contains_key(&from);
    let to_watched = config.watched.contains_key(&to);
    WatchedSide::from_membership(from_watched, to_watched)
}

/// Build the emitted event for an admitted transaction.
#[must_use]
pub fn build_event(
    config: &Config,
    clock: &dyn Clock,
    kind: TransferKind,
    tx: &RawTransaction,
    to: EthAddress,
    watched_side: WatchedSide,
) -> TransferEvent {
    TransferEvent {
        kind,
        tx_hash: tx.hash,
        from: tx.from,
        to,
        from_label: config.lookup(&tx.from).map(|w| w.label.clone()),
        to_label: config.lookup(&to).map(|w| w.label.clone()),
        value_wei: tx.value,
        block_number: match kind {
            TransferKind::Confirmed => tx.block_number,
            TransferKind::Pending => None,
        },
        watched_side,
        seen_in_mempool: matches!(kind, TransferKind::Pending),
        timestamp: clock.now(),
    }
}
