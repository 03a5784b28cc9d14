//! The streaming RPC client abstraction (component A).
//!
//! A narrow capability set over one persistent bidirectional connection to a
//! single endpoint. The trait exists so the pool and the continuity engine
//! can be driven by a scriptable mock in tests instead of a live socket.

mod client;

pub use client::{AlloyRpcClient, HeadStream, PendingHashStream, StreamingRpcClient};
