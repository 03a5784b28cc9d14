//! The watch-list entity.

use serde::{Deserialize, Serialize};

use super::primitives::EthAddress;

/// A single watch-listed wallet.
///
/// Labels need not be unique; addresses must be unique after normalization,
/// which `Config` enforces at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedWallet {
    /// Operator-facing label (e.g. "Binance Hot Wallet 14").
    pub label: String,
    /// Normalized chain address.
    pub address: EthAddress,
}

impl WatchedWallet {
    /// Construct a watched wallet from a label and an address.
    #[must_use]
    pub const fn new(label: String, address: EthAddress) -> Self {
        Self { label, address }
    }
}
