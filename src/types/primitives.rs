//! Validated primitive types for the watch-list transfer domain.
//!
//! These newtypes provide:
//! - Type safety (can't accidentally pass a value as an address)
//! - Validation and normalization at construction time
//! - Exact decimal arithmetic for wei/eth conversion (no floating point)

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ETHEREUM ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Validated 20-byte chain address, always normalized to lowercase hex.
///
/// Normalization happens once at construction so every later comparison,
/// hash, or map lookup is a plain byte/string comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EthAddress([u8; 20]);

impl EthAddress {
    /// Create from a fixed-size array (infallible).
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Try to create from a byte slice.
    ///
    /// # Errors
    /// Returns `InvalidAddress::WrongLength` if the slice is not exactly 20 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, InvalidAddress> {
        let bytes: [u8; 20] = slice
            .try_into()
            .map_err(|_| InvalidAddress::WrongLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Parse from hex string (with or without 0x prefix), case-insensitive.
    ///
    /// # Errors
    /// Returns `InvalidAddress` if the string is not valid hex or wrong length.
    pub fn from_hex(s: &str) -> Result<Self, InvalidAddress> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 40 {
            return Err(InvalidAddress::WrongLength(s.len() / 2));
        }
        let bytes = hex::decode(s).map_err(|_| InvalidAddress::InvalidHex)?;
        Self::from_slice(&bytes)
    }

    /// Get the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to lowercase hex string with 0x prefix. This is the
    /// canonical (normalized) representation used for all comparisons.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Check if this is the zero address (contract creation marker).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress({})", self.to_hex())
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<EthAddress> for String {
    fn from(addr: EthAddress) -> Self {
        addr.to_hex()
    }
}

impl TryFrom<String> for EthAddress {
    type Error = InvalidAddress;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl TryFrom<&str> for EthAddress {
    type Error = InvalidAddress;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::from_hex(s)
    }
}

impl From<[u8; 20]> for EthAddress {
    fn from(bytes: [u8; 20]) -> Self {
        Self::new(bytes)
    }
}

impl From<Address> for EthAddress {
    fn from(addr: Address) -> Self {
        Self::new(addr.0.0)
    }
}

impl From<EthAddress> for Address {
    fn from(addr: EthAddress) -> Self {
        Self::from(addr.0)
    }
}

/// Error for invalid chain addresses.
#[derive(Debug, Clone, Error)]
pub enum InvalidAddress {
    /// Address has wrong byte length.
    #[error("wrong length: expected 20 bytes, got {0}")]
    WrongLength(usize),
    /// Address contains invalid hex characters.
    #[error("invalid hex encoding")]
    InvalidHex,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSACTION HASH
// ═══════════════════════════════════════════════════════════════════════════════

/// A 32-byte transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(B256);

impl TxHash {
    /// Wrap a raw `B256`.
    #[must_use]
    pub const fn new(hash: B256) -> Self {
        Self(hash)
    }

    /// Parse from hex string (with or without 0x prefix).
    ///
    /// # Errors
    /// Returns `InvalidHash` if the string is not valid 32-byte hex.
    pub fn from_hex(s: &str) -> Result<Self, InvalidHash> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 64 {
            return Err(InvalidHash::WrongLength(s.len() / 2));
        }
        let bytes = hex::decode(s).map_err(|_| InvalidHash::InvalidHex)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| InvalidHash::WrongLength(32))?;
        Ok(Self(B256::from(arr)))
    }

    /// Convert to lowercase hex string with 0x prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("{:?}", self.0)
    }

    /// Get the underlying `B256`.
    #[must_use]
    pub const fn inner(&self) -> B256 {
        self.0
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<TxHash> for String {
    fn from(hash: TxHash) -> Self {
        hash.to_hex()
    }
}

impl TryFrom<String> for TxHash {
    type Error = InvalidHash;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<B256> for TxHash {
    fn from(hash: B256) -> Self {
        Self(hash)
    }
}

impl From<TxHash> for B256 {
    fn from(hash: TxHash) -> Self {
        hash.0
    }
}

/// Error for invalid transaction hashes.
#[derive(Debug, Clone, Error)]
pub enum InvalidHash {
    /// Hash has wrong byte length.
    #[error("wrong length: expected 32 bytes, got {0}")]
    WrongLength(usize),
    /// Hash contains invalid hex characters.
    #[error("invalid hex encoding")]
    InvalidHex,
}

// ═══════════════════════════════════════════════════════════════════════════════
// WEI AMOUNT (exact arithmetic, no floating point)
// ═══════════════════════════════════════════════════════════════════════════════

/// A non-negative amount of native-token value, always exact.
///
/// Internally backed by `alloy::primitives::U256` (the unit alloy hands back
/// from RPC responses, and the unit transfer thresholds are ultimately
/// compared in). Operator-facing decimal strings (ETH, not wei) are parsed
/// through `BigDecimal` and scaled to an integer wei string before ever
/// touching `U256::from_str` — never through a floating-point multiply,
/// which loses precision on amounts this large.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeiAmount(U256);

impl WeiAmount {
    /// Zero wei.
    pub const ZERO: Self = Self(U256::ZERO);

    /// Wrap a raw `U256` wei value.
    #[must_use]
    pub const fn from_u256(value: U256) -> Self {
        Self(value)
    }

    /// Get the underlying `U256`.
    #[must_use]
    pub const fn as_u256(&self) -> U256 {
        self.0
    }

    /// Parse a decimal ETH string (e.g. "100", "0.5") into exact wei,
    /// assuming the chain's native 18-decimal scale.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if the string does not parse as a non-negative decimal.
    pub fn from_eth_str(s: &str) -> Result<Self, InvalidAmount> {
        let decimal = BigDecimal::from_str(s).map_err(|_| InvalidAmount::ParseError)?;
        if decimal.sign() == bigdecimal::num_bigint::Sign::Minus {
            return Err(InvalidAmount::Negative);
        }
        let scaled = decimal * BigDecimal::from(10_u64.pow(18));
        // `scaled` must be an integer at this scale; truncating fractional
        // wei (sub-wei dust from an absurdly precise input) is acceptable.
        let int_str = scaled.with_scale(0).to_string();
        let wei = U256::from_str(&int_str).map_err(|_| InvalidAmount::ParseError)?;
        Ok(Self(wei))
    }

    /// Render as a decimal ETH string with full 18-digit scale.
    #[must_use]
    pub fn to_eth_string(&self) -> String {
        let wei_str = self.0.to_string();
        let decimal = BigDecimal::from_str(&wei_str).unwrap_or_default()
            / BigDecimal::from(10_u64.pow(18));
        decimal.to_string()
    }

    /// Check if zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for WeiAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<U256> for WeiAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<WeiAmount> for U256 {
    fn from(amount: WeiAmount) -> Self {
        amount.0
    }
}

/// Error for invalid wei/eth amounts.
#[derive(Debug, Clone, Error)]
pub enum InvalidAmount {
    /// Amount cannot be negative.
    #[error("amount cannot be negative")]
    Negative,
    /// Failed to parse amount string.
    #[error("failed to parse amount")]
    ParseError,
}

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCK NUMBER (for type clarity)
// ═══════════════════════════════════════════════════════════════════════════════

/// Block number newtype for clarity in function signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockNumber(u64);

impl BlockNumber {
    /// Create a new block number.
    #[must_use]
    pub const fn new(n: u64) -> Self {
        Self(n)
    }

    /// Get the value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the next block number (saturating at `u64::MAX`).
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the previous block number (saturating at 0).
    #[must_use]
    pub const fn prev(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl From<u64> for BlockNumber {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl From<BlockNumber> for u64 {
    fn from(b: BlockNumber) -> Self {
        b.0
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod eth_address_tests {
        use super::*;

        #[test]
        fn from_hex_with_prefix() {
            let addr = EthAddress::from_hex("0x1234567890123456789012345678901234567890").unwrap();
            assert_eq!(addr.to_hex(), "0x1234567890123456789012345678901234567890");
        }

        #[test]
        fn from_hex_without_prefix() {
            let addr = EthAddress::from_hex("1234567890123456789012345678901234567890").unwrap();
            assert_eq!(addr.to_hex(), "0x1234567890123456789012345678901234567890");
        }

        #[test]
        fn normalizes_uppercase_to_lowercase() {
            let upper = EthAddress::from_hex("0xABCDEF1234567890123456789012345678901234").unwrap();
            let lower = EthAddress::from_hex("0xabcdef1234567890123456789012345678901234").unwrap();
            assert_eq!(upper, lower);
            assert_eq!(upper.to_hex(), lower.to_hex());
        }

        #[test]
        fn from_hex_wrong_length() {
            assert!(EthAddress::from_hex("0x1234").is_err());
        }

        #[test]
        fn from_hex_invalid_chars() {
            assert!(EthAddress::from_hex("0xgggggggggggggggggggggggggggggggggggggggg").is_err());
        }

        #[test]
        fn zero_address() {
            assert!(EthAddress::ZERO.is_zero());
        }

        #[test]
        fn alloy_address_roundtrip() {
            let addr_hex = "0x1234567890123456789012345678901234567890";
            let eth_addr = EthAddress::from_hex(addr_hex).unwrap();
            let alloy_addr: Address = eth_addr.into();
            let back: EthAddress = alloy_addr.into();
            assert_eq!(eth_addr, back);
        }
    }

    mod tx_hash_tests {
        use super::*;

        #[test]
        fn from_hex_roundtrip() {
            let hex = "0x1111111111111111111111111111111111111111111111111111111111111111"
                .get(0..66)
                .unwrap();
            let hash = TxHash::from_hex(hex).unwrap();
            assert_eq!(hash.to_hex(), hex.to_lowercase());
        }

        #[test]
        fn wrong_length_rejected() {
            assert!(TxHash::from_hex("0x1234").is_err());
        }
    }

    mod wei_amount_tests {
        use super::*;

        #[test]
        fn parses_whole_eth() {
            let amount = WeiAmount::from_eth_str("100").unwrap();
            assert_eq!(amount.as_u256(), U256::from(100_u128) * U256::from(10_u128).pow(U256::from(18)));
        }

        #[test]
        fn parses_fractional_eth_exactly() {
            let amount = WeiAmount::from_eth_str("1.5").unwrap();
            assert_eq!(amount.as_u256(), U256::from(1_500_000_000_000_000_000_u128));
        }

        #[test]
        fn negative_rejected() {
            assert!(WeiAmount::from_eth_str("-1").is_err());
        }

        #[test]
        fn roundtrips_through_eth_string() {
            let amount = WeiAmount::from_eth_str("3.14").unwrap();
            assert_eq!(amount.to_eth_string(), "3.14");
        }

        #[test]
        fn ordering_respects_wei_not_string() {
            let small = WeiAmount::from_eth_str("0.5").unwrap();
            let large = WeiAmount::from_eth_str("100").unwrap();
            assert!(small < large);
        }
    }

    mod block_number_tests {
        use super::*;

        #[test]
        fn next_and_prev() {
            let block = BlockNumber::new(100);
            assert_eq!(block.next().get(), 101);
            assert_eq!(block.prev().get(), 99);
        }

        #[test]
        fn prev_saturates_at_zero() {
            assert_eq!(BlockNumber::new(0).prev().get(), 0);
        }
    }
}
