//! Transfer Sentinel
//!
//! A real-time watch-list transfer monitor for EVM-compatible chains. Watches
//! a configured set of wallet addresses over a failover pool of WebSocket RPC
//! endpoints and reports every transfer that touches the watch-list and
//! clears a minimum value threshold, both as it appears in the mempool and
//! once it is confirmed in a block.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                           ORCHESTRATOR                            │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌────────────────────┐  │
//! │  │  Endpoint    │─▶│     Block         │─▶│       Block        │  │
//! │  │    Pool      │  │  Continuity Engine│  │      Processor     │  │
//! │  └──────────────┘  └──────────────────┘  └────────────────────┘  │
//! │         │                                           │             │
//! │         ▼                                           ▼             │
//! │  ┌──────────────┐                           ┌────────────────┐   │
//! │  │   Pending    │──────────────────────────▶│      Sink       │   │
//! │  │  Processor   │                           └────────────────┘   │
//! │  └──────────────┘                                                │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`] - Domain types (enums, events, wallet, chain primitives)
//! - [`error`] - Layered error types
//! - [`config`] - Layered configuration loading and validation
//! - [`ports`] - Testability seams (clock, sink)
//! - [`rpc`] - The streaming RPC client abstraction
//! - [`pool`] - The failover-aware endpoint pool
//! - [`continuity`] - The block continuity / gap-filling engine
//! - [`pipeline`] - Dedup set and the confirmed/pending transaction processors
//! - [`orchestrator`] - Component wiring and process lifecycle
//! - [`sink`] - Output sinks (terminal)
//!
//! # Getting Started
//!
//! ```bash
//! # Set up environment
//! cp .env.example .env
//! # Edit .env with your RPC endpoints and watch-list
//!
//! # Check configuration without connecting
//! cargo run -- check-config
//!
//! # Start watching
//! cargo run -- run
//! ```

#![doc(html_root_url = "https://docs.transfer-sentinel.io")]

pub mod config;
pub mod continuity;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod ports;
pub mod pool;
pub mod rpc;
pub mod sink;
pub mod types;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version string.
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert!(version().starts_with("0."));
    }
}
