//! The block continuity engine (component C).
//!
//! Guarantees every block number in `[first-observed, latest-observed]` is
//! processed exactly once, in strict ascending order, across disconnections
//! and silent gaps.

mod engine;

pub use engine::{BlockContinuityEngine, BlockSink, ProcessOutcome, ReconnectOutcome};
