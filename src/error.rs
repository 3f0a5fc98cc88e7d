//! Gateway error taxonomy.
//!
//! One enum covers every failure kind the dispatch engine and its HTTP
//! surface can produce. Message-level failures (`NoHealthyAnalyzer`,
//! `AnalyzerRejected`, `AnalyzerFailure`) are isolated by the worker loop
//! and never abort a packet; only startup errors are fatal to the process.

use thiserror::Error;

/// Errors produced by the gateway core and surfaced at its boundaries.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed input at a boundary (bad weight, bad URL, empty id).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The dispatch queue is at capacity; the packet was not accepted.
    #[error("queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// No analyzer in the registry is currently healthy.
    #[error("no healthy analyzer available")]
    NoHealthyAnalyzer,

    /// The healthy set's weights sum to zero; nothing can be selected.
    #[error("analyzer weights sum to zero")]
    InvalidWeights,

    /// The analyzer answered 4xx: the message was rejected, but the
    /// analyzer itself is not considered failing.
    #[error("analyzer rejected message with status {0}")]
    AnalyzerRejected(u16),

    /// 5xx, connection failure, or timeout: a health-degrading outcome.
    #[error("analyzer failure: {0}")]
    AnalyzerFailure(String),

    /// Unknown id on an administrative operation.
    #[error("analyzer not found: {0}")]
    NotFound(String),

    /// The operation was terminated by graceful shutdown.
    #[error("gateway is shutting down")]
    Shutdown,
}
