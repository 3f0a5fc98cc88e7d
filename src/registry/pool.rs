//! Analyzer pool management.
//!
//! # Responsibilities
//! - Hold the mutable set of analyzer records keyed by id
//! - Validate admission parameters at the boundary
//! - Provide consistent snapshots for selection and reporting

use std::sync::Arc;

use dashmap::DashMap;
use url::Url;

use crate::error::GatewayError;
use crate::events::{EventBus, GatewayEvent};
use crate::registry::analyzer::{Analyzer, AnalyzerSnapshot};

/// The mutable analyzer set. Many readers, few writers.
#[derive(Debug)]
pub struct AnalyzerRegistry {
    analyzers: DashMap<String, Arc<Analyzer>>,
    events: EventBus,
}

impl AnalyzerRegistry {
    pub fn new(events: EventBus) -> Self {
        Self {
            analyzers: DashMap::new(),
            events,
        }
    }

    /// Admit an analyzer into the pool.
    ///
    /// An existing id is replaced wholesale: endpoint and weight are
    /// updated, health counters reset, and the analyzer starts healthy.
    pub fn admit(&self, id: &str, endpoint: &str, weight: f64) -> Result<AnalyzerSnapshot, GatewayError> {
        if id.is_empty() {
            return Err(GatewayError::InvalidArgument(
                "analyzer id must not be empty".to_string(),
            ));
        }
        let endpoint = Url::parse(endpoint).map_err(|e| {
            GatewayError::InvalidArgument(format!("invalid endpoint '{endpoint}': {e}"))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidArgument(format!(
                "endpoint must be an absolute http(s) URL, got '{endpoint}'"
            )));
        }
        if !(weight > 0.0) {
            return Err(GatewayError::InvalidArgument(format!(
                "weight must be positive, got {weight}"
            )));
        }

        let analyzer = Arc::new(Analyzer::new(id.to_string(), endpoint, weight));
        let snapshot = analyzer.snapshot();
        self.analyzers.insert(id.to_string(), analyzer);
        self.events
            .publish(GatewayEvent::AnalyzerAdmitted { id: id.to_string() });
        Ok(snapshot)
    }

    /// Remove an analyzer. Idempotent; returns whether a record was removed.
    ///
    /// In-flight sends against the removed analyzer keep their `Arc` handle;
    /// their late outcomes land on the detached record and are never visible
    /// again.
    pub fn evict(&self, id: &str) -> bool {
        let removed = self.analyzers.remove(id).is_some();
        if removed {
            self.events
                .publish(GatewayEvent::AnalyzerEvicted { id: id.to_string() });
        }
        removed
    }

    /// Live record handle for outcome recording.
    pub fn lookup(&self, id: &str) -> Option<Arc<Analyzer>> {
        self.analyzers.get(id).map(|entry| entry.value().clone())
    }

    /// Point-in-time copy of every record, each taken under its own lock.
    pub fn snapshot(&self) -> Vec<AnalyzerSnapshot> {
        self.analyzers
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Number of analyzers currently in the healthy set.
    pub fn healthy_count(&self) -> usize {
        self.analyzers
            .iter()
            .filter(|entry| entry.value().is_healthy())
            .count()
    }
}
