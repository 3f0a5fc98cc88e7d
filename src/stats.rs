//! Process-wide aggregate counters.
//!
//! All counters are atomics updated with relaxed arithmetic; readers may
//! observe non-atomic composite views (the average latency is best-effort).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Aggregate gateway counters, shared by ingress, workers and the stats
/// endpoint.
#[derive(Debug, Default)]
pub struct GatewayStats {
    packets_received: AtomicU64,
    packets_processed: AtomicU64,
    packets_dropped: AtomicU64,
    errors: AtomicU64,
    total_latency_ms: AtomicU64,
}

/// Point-in-time copy of the aggregate counters for reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub packets_received: u64,
    pub packets_processed: u64,
    pub packets_dropped: u64,
    pub errors: u64,
    pub total_latency_ms: u64,
    pub avg_latency_ms: f64,
}

impl GatewayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_packet_received(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    /// A packet counts processed once every message in it has been attempted.
    pub fn record_packet_processed(&self, latency_ms: u64) {
        self.packets_processed.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_packets_dropped(&self, n: u64) {
        self.packets_dropped.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packets_received(&self) -> u64 {
        self.packets_received.load(Ordering::Relaxed)
    }

    pub fn packets_processed(&self) -> u64 {
        self.packets_processed.load(Ordering::Relaxed)
    }

    pub fn packets_dropped(&self) -> u64 {
        self.packets_dropped.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let processed = self.packets_processed.load(Ordering::Relaxed);
        let total_latency_ms = self.total_latency_ms.load(Ordering::Relaxed);
        let avg_latency_ms = if processed > 0 {
            total_latency_ms as f64 / processed as f64
        } else {
            0.0
        };
        StatsSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            packets_processed: processed,
            packets_dropped: self.packets_dropped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            total_latency_ms,
            avg_latency_ms,
        }
    }
}
