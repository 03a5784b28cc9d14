//! Closed enumerations used throughout the detection pipeline.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFER KIND
// ═══════════════════════════════════════════════════════════════════════════════

/// Whether a transfer was observed in the mempool or in a confirmed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// Seen in the mempool, not yet included in a block.
    Pending,
    /// Included in a confirmed block.
    Confirmed,
}

impl TransferKind {
    /// Human-readable name for display.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
        }
    }
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WATCHED SIDE
// ═══════════════════════════════════════════════════════════════════════════════

/// Which side(s) of a transfer touch the watch-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchedSide {
    /// Only the sender is watched.
    From,
    /// Only the recipient is watched.
    To,
    /// Both sender and recipient are watched.
    Both,
}

impl WatchedSide {
    /// Derive the watched side from set-membership booleans.
    ///
    /// Returns `None` if neither side is watched (caller should not have
    /// admitted the transfer in the first place).
    #[must_use]
    pub const fn from_membership(from_watched: bool, to_watched: bool) -> Option<Self> {
        match (from_watched, to_watched) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::From),
            (false, true) => Some(Self::To),
            (false, false) => None,
        }
    }
}

impl std::fmt::Display for WatchedSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::From => "from",
            Self::To => "to",
            Self::Both => "both",
        };
        write!(f, "{s}")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENDPOINT STATUS
// ═══════════════════════════════════════════════════════════════════════════════

/// Health classification of a single RPC endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    /// No recent failures.
    Healthy,
    /// Some recent failures, still eligible for rotation.
    Degraded,
    /// Enough consecutive failures that the endpoint is skipped until cooldown expires.
    Down,
}

impl EndpointStatus {
    /// Classify a consecutive-failure count into a status.
    ///
    /// `0` failures is always `Healthy`; `Down` kicks in at 3 or more.
    #[must_use]
    pub const fn from_fail_count(fail_count: u32) -> Self {
        match fail_count {
            0 => Self::Healthy,
            1 | 2 => Self::Degraded,
            _ => Self::Down,
        }
    }

    /// Whether this endpoint should be skipped by rotation right now,
    /// independent of cooldown timing.
    #[must_use]
    pub const fn is_down(&self) -> bool {
        matches!(self, Self::Down)
    }
}

impl std::fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Down => "down",
        };
        write!(f, "{s}")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
