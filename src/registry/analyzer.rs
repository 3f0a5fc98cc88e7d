//! Analyzer record abstraction.
//!
//! # Responsibilities
//! - Represent a single downstream analyzer
//! - Track per-analyzer health counters under one lock
//! - Apply the 3-strikes health state machine on each outcome

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// Whether an outcome came from a dispatch attempt or an active probe.
///
/// Both feed the same state machine; failure totals are kept separate so
/// the two sources stay distinguishable in stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Dispatch,
    Probe,
}

/// A health flag transition caused by recording an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthTransition {
    Degraded,
    Recovered,
}

/// Mutable per-analyzer health state. Guarded by the analyzer's lock so
/// counter arithmetic and the health flag always move together.
#[derive(Debug)]
struct HealthState {
    healthy: bool,
    consecutive_successes: u32,
    consecutive_failures: u32,
    total_checks: u64,
    total_failures: u64,
    dispatch_failures: u64,
    probe_failures: u64,
    last_response_time_ms: u64,
    last_seen: Option<DateTime<Utc>>,
}

impl HealthState {
    fn new() -> Self {
        Self {
            // Admit is trusted: a new analyzer is healthy with no priors.
            healthy: true,
            consecutive_successes: 0,
            consecutive_failures: 0,
            total_checks: 0,
            total_failures: 0,
            dispatch_failures: 0,
            probe_failures: 0,
            last_response_time_ms: 0,
            last_seen: None,
        }
    }
}

/// A single pool member.
#[derive(Debug)]
pub struct Analyzer {
    /// Opaque stable identifier, unique within the registry.
    pub id: String,
    /// Absolute base URL; dispatch and probe paths are appended to it.
    pub endpoint: Url,
    /// Relative routing share among currently-healthy peers.
    pub weight: f64,
    state: Mutex<HealthState>,
}

/// Point-in-time copy of an analyzer record, sufficient for selection and
/// reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerSnapshot {
    pub id: String,
    pub endpoint: String,
    pub weight: f64,
    pub healthy: bool,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
    pub total_checks: u64,
    pub total_failures: u64,
    pub dispatch_failures: u64,
    pub probe_failures: u64,
    pub last_response_time_ms: u64,
    pub last_seen: Option<DateTime<Utc>>,
}

impl AnalyzerSnapshot {
    /// URL of the analyzer's dispatch endpoint.
    pub fn analyze_url(&self) -> String {
        format!("{}/analyze", self.endpoint.trim_end_matches('/'))
    }

    /// URL of the analyzer's liveness endpoint.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.endpoint.trim_end_matches('/'))
    }
}

impl Analyzer {
    pub fn new(id: String, endpoint: Url, weight: f64) -> Self {
        Self {
            id,
            endpoint,
            weight,
            state: Mutex::new(HealthState::new()),
        }
    }

    /// URL of the analyzer's dispatch endpoint.
    pub fn analyze_url(&self) -> String {
        format!("{}/analyze", self.endpoint.as_str().trim_end_matches('/'))
    }

    /// URL of the analyzer's liveness endpoint.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.endpoint.as_str().trim_end_matches('/'))
    }

    pub fn is_healthy(&self) -> bool {
        self.state.lock().expect("analyzer lock poisoned").healthy
    }

    /// Record one dispatch or probe outcome and evaluate state transitions.
    ///
    /// The whole update, including a health flip, happens under the record
    /// lock so snapshot readers see either the pre- or post-outcome view.
    pub fn record(
        &self,
        kind: OutcomeKind,
        success: bool,
        rtt_ms: u64,
        failure_threshold: u32,
        success_threshold: u32,
    ) -> Option<HealthTransition> {
        let mut state = self.state.lock().expect("analyzer lock poisoned");

        state.total_checks += 1;
        state.last_response_time_ms = rtt_ms;

        if success {
            state.consecutive_successes += 1;
            state.consecutive_failures = 0;
            state.last_seen = Some(Utc::now());
        } else {
            state.total_failures += 1;
            match kind {
                OutcomeKind::Dispatch => state.dispatch_failures += 1,
                OutcomeKind::Probe => state.probe_failures += 1,
            }
            state.consecutive_failures += 1;
            state.consecutive_successes = 0;
        }

        if !state.healthy && state.consecutive_successes >= success_threshold {
            state.healthy = true;
            Some(HealthTransition::Recovered)
        } else if state.healthy && state.consecutive_failures >= failure_threshold {
            state.healthy = false;
            Some(HealthTransition::Degraded)
        } else {
            None
        }
    }

    /// Take a consistent copy of the record under its lock.
    pub fn snapshot(&self) -> AnalyzerSnapshot {
        let state = self.state.lock().expect("analyzer lock poisoned");
        AnalyzerSnapshot {
            id: self.id.clone(),
            endpoint: self.endpoint.to_string(),
            weight: self.weight,
            healthy: state.healthy,
            consecutive_successes: state.consecutive_successes,
            consecutive_failures: state.consecutive_failures,
            total_checks: state.total_checks,
            total_failures: state.total_failures,
            dispatch_failures: state.dispatch_failures,
            probe_failures: state.probe_failures,
            last_response_time_ms: state.last_response_time_ms,
            last_seen: state.last_seen,
        }
    }
}
