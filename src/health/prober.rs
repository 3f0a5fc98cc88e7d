//! Active health probing.
//!
//! # Responsibilities
//! - Periodically probe every analyzer's health endpoint
//! - Feed probe outcomes into the shared state machine
//! - Serve synchronous probe requests from the admin surface
//!
//! # Design Decisions
//! - Probes share the dispatch HTTP client and its connection pool
//! - Per-probe timeout, distinct from the dispatch timeout
//! - Runs as a background task; a slow analyzer never delays the others

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::error::GatewayError;
use crate::health::recorder::OutcomeRecorder;
use crate::observability::metrics;
use crate::registry::{AnalyzerRegistry, AnalyzerSnapshot, OutcomeKind};

/// Periodic liveness prober over the registry.
#[derive(Debug)]
pub struct HealthProber {
    registry: Arc<AnalyzerRegistry>,
    recorder: Arc<OutcomeRecorder>,
    client: reqwest::Client,
    interval: Duration,
    timeout: Duration,
}

impl HealthProber {
    pub fn new(
        registry: Arc<AnalyzerRegistry>,
        recorder: Arc<OutcomeRecorder>,
        client: reqwest::Client,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            recorder,
            client,
            interval,
            timeout,
        }
    }

    /// Probe every analyzer on a fixed period until stop is signalled.
    pub async fn run(self: Arc<Self>, mut stop: broadcast::Receiver<()>) {
        // First sweep after one full period; admit is trusted, so a fresh
        // analyzer needs no immediate confirmation.
        let start = tokio::time::Instant::now() + self.interval;
        let mut ticker = tokio::time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Health prober started");

        loop {
            tokio::select! {
                _ = stop.recv() => break,
                _ = ticker.tick() => self.probe_all().await,
            }
        }

        tracing::info!("Health prober stopped");
    }

    /// One probe sweep over the current registry snapshot, all analyzers
    /// concurrently.
    async fn probe_all(&self) {
        let snapshots = self.registry.snapshot();
        if snapshots.is_empty() {
            return;
        }
        let probes = snapshots.iter().map(|snapshot| self.probe(snapshot));
        futures_util::future::join_all(probes).await;
    }

    /// Probe one analyzer and record the outcome.
    async fn probe(&self, snapshot: &AnalyzerSnapshot) -> bool {
        let start = Instant::now();
        let response = self
            .client
            .get(snapshot.health_url())
            .timeout(self.timeout)
            .send()
            .await;
        let rtt_ms = start.elapsed().as_millis() as u64;

        let success = matches!(&response, Ok(resp) if resp.status().is_success());
        if !success {
            tracing::debug!(
                analyzer = %snapshot.id,
                outcome = ?response.as_ref().map(|r| r.status()),
                "Probe failed"
            );
        }

        self.recorder
            .record_outcome(&snapshot.id, OutcomeKind::Probe, success, rtt_ms);
        metrics::record_probe(&snapshot.id, success);
        success
    }

    /// Run one probe synchronously; returns once the outcome is recorded.
    ///
    /// The returned snapshot reflects the analyzer state after the probe.
    pub async fn trigger_probe(&self, id: &str) -> Result<AnalyzerSnapshot, GatewayError> {
        let analyzer = self
            .registry
            .lookup(id)
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;

        self.probe(&analyzer.snapshot()).await;

        // Re-read after recording; the analyzer may have been evicted while
        // the probe was in flight.
        self.registry
            .lookup(id)
            .map(|analyzer| analyzer.snapshot())
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }
}
