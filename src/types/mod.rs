//! Domain types for the transfer watcher.
//!
//! - [`enums`] - closed enumerations (`TransferKind`, `WatchedSide`, `EndpointStatus`)
//! - [`primitives`] - validated newtypes (`EthAddress`, `TxHash`, `WeiAmount`, `BlockNumber`)
//! - [`chain`] - raw chain data (`RawTransaction`, `FetchedBlock`)
//! - [`events`] - the emitted `TransferEvent`
//! - [`wallet`] - the watch-list entity

pub mod chain;
pub mod enums;
pub mod events;
pub mod primitives;
pub mod wallet;

pub use chain::{FetchedBlock, RawTransaction};
pub use enums::{EndpointStatus, TransferKind, WatchedSide};
pub use events::TransferEvent;
pub use primitives::{BlockNumber, EthAddress, InvalidAddress, InvalidAmount, InvalidHash, TxHash, WeiAmount};
pub use wallet::WatchedWallet;
