//! Observability.
//!
//! # Design Decisions
//! - `tracing` for structured logging, initialized once in `main`
//! - Prometheus exposition on a separate address via the `metrics` facade
//! - Lifecycle events reach the log stream through the event logger task

pub mod metrics;
