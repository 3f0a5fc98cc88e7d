//! Analyzer registry subsystem.
//!
//! # Data Flow
//! ```text
//! Admin admit/evict → pool.rs (mutate the analyzer set)
//!     → analyzer.rs (per-record health state under its own lock)
//!     → snapshot() consumed by the selector, the prober and /stats
//! ```
//!
//! # Design Decisions
//! - The registry exclusively owns analyzer records
//! - Per-analyzer locks, not a global lock; distinct analyzers update in parallel
//! - Snapshots are per-record consistent: an update is fully visible or not at all

pub mod analyzer;
pub mod pool;

pub use analyzer::{Analyzer, AnalyzerSnapshot, HealthTransition, OutcomeKind};
pub use pool::AnalyzerRegistry;
