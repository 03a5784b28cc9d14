//! Raw chain data as read off the wire, before any filtering is applied.

use super::primitives::{BlockNumber, EthAddress, TxHash, WeiAmount};

/// A transaction as read from a block or from `eth_getTransactionByHash`.
///
/// `to: None` denotes contract creation and is always filtered out by the
/// detection pipeline's `should_process` check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    /// Transaction hash.
    pub hash: TxHash,
    /// Sender address.
    pub from: EthAddress,
    /// Recipient address, `None` for contract creation.
    pub to: Option<EthAddress>,
    /// Transfer value in wei.
    pub value: WeiAmount,
    /// Containing block, `None` for a pending (mempool) transaction fetched standalone.
    pub block_number: Option<BlockNumber>,
}

/// A fully-fetched block, including transaction bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBlock {
    /// Block number.
    pub number: BlockNumber,
    /// Every transaction in the block, in transaction-index order.
    pub transactions: Vec<RawTransaction>,
}
