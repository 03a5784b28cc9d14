//! Layered error types for the transfer watcher.
//!
//! - [`ConfigError`] - invalid configuration, always fatal at startup
//! - [`NetworkError`] - RPC/subscription failures, handled by the endpoint pool, never fatal
//! - [`CoreError`] - everything the core pipeline can fail with
//! - [`SentinelError`] - top-level error returned from `main`
//!
//! # Error Philosophy
//!
//! Transient network failures are absorbed at the closest boundary (the
//! endpoint pool rotates and reconnects); only configuration errors and
//! genuinely unexpected internal errors propagate to the process exit path.

use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIG ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration-time errors. Always fatal; the process exits before
/// attempting any RPC connection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// No endpoints were configured.
    #[error("at least one RPC endpoint must be configured")]
    NoEndpoints,

    /// An endpoint URL failed to parse or uses a disallowed scheme.
    #[error("invalid endpoint url {0}: must be ws:// or wss://")]
    InvalidEndpoint(String),

    /// The threshold value failed to parse as a non-negative decimal.
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),

    /// A watch-list entry had a malformed address.
    #[error("invalid watch-list address {0}: {1}")]
    InvalidWatchedAddress(String, crate::types::InvalidAddress),

    /// Two watch-list entries normalized to the same address.
    #[error("duplicate watch-list address: {0}")]
    DuplicateWatchedAddress(String),

    /// Underlying layered config-file/env loading failure.
    #[error("configuration loading error: {0}")]
    Loading(#[from] config::ConfigError),
}

// ═══════════════════════════════════════════════════════════════════════════════
// NETWORK ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Transport-level failures talking to an RPC endpoint.
///
/// Never fatal: the endpoint pool absorbs these, updates endpoint health,
/// and rotates to the next candidate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NetworkError {
    /// The underlying transport reported an error.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A single RPC call exceeded its timeout.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The connection closed (cleanly or otherwise).
    #[error("connection closed: {0}")]
    Closed(String),

    /// A subscription ended unexpectedly.
    #[error("subscription ended: {0}")]
    SubscriptionEnded(String),

    /// The server signaled rate limiting.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The server doesn't support the requested subscription
    /// (e.g. `newPendingTransactions` on a provider that only offers `newHeads`).
    #[error("subscription not supported: {0}")]
    PendingUnsupported(String),
}

impl NetworkError {
    /// Recognize a rate-limit condition by substring match, the fallback
    /// path for providers that don't return a structured error code.
    #[must_use]
    pub fn looks_like_rate_limit(message: &str) -> bool {
        let lower = message.to_lowercase();
        ["429", "rate limit", "quota"]
            .iter()
            .any(|needle| lower.contains(needle))
    }

    /// Recognize an unsupported-subscription condition by substring match,
    /// the fallback for a generic transport error instead of a structured
    /// JSON-RPC "method not found" response.
    #[must_use]
    pub fn looks_like_unsupported(message: &str) -> bool {
        let lower = message.to_lowercase();
        ["not supported", "not available", "unsupported", "method not found"]
            .iter()
            .any(|needle| lower.contains(needle))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CORE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors surfaced by the core detection pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A network/transport failure; carried for logging, never the reason
    /// to abort the pipeline.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Every configured endpoint is currently in cooldown.
    #[error("all endpoints are in cooldown, retrying in {0:?}")]
    AllEndpointsCoolingDown(std::time::Duration),

    /// The pool was explicitly torn down.
    #[error("endpoint pool destroyed")]
    PoolDestroyed,

    /// Per-transaction processing failure (logged at debug, swallowed).
    #[error("per-transaction error: {0}")]
    PerTransaction(String),

    /// Per-block backfill failure (logged at error, skipped, does not stall the sequence).
    #[error("per-backfill-block error on block {block}: {source}")]
    PerBackfillBlock {
        /// The block number that failed to fetch.
        block: u64,
        /// The underlying cause.
        #[source]
        source: NetworkError,
    },

    /// A programmer-error-grade invariant violation.
    #[error("internal invariant violated: {0}")]
    FatalInternal(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOP-LEVEL ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// The error type returned from `main`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SentinelError {
    /// Fatal configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Fatal internal/core error (configuration was fine, something inside
    /// the pipeline itself broke in a way that can't be absorbed).
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Type alias for core-pipeline results.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Type alias for top-level results.
pub type Result<T> = std::result::Result<T, SentinelError>;
