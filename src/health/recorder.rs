//! Outcome recording.
//!
//! The single entry point through which dispatch results and probe results
//! reach per-analyzer state. Each analyzer's update runs under that
//! analyzer's own lock; distinct analyzers record in parallel.

use std::sync::Arc;

use crate::events::{EventBus, GatewayEvent};
use crate::registry::{AnalyzerRegistry, HealthTransition, OutcomeKind};

/// Applies outcomes to analyzer records and publishes health transitions.
#[derive(Debug)]
pub struct OutcomeRecorder {
    registry: Arc<AnalyzerRegistry>,
    events: EventBus,
    failure_threshold: u32,
    success_threshold: u32,
}

impl OutcomeRecorder {
    pub fn new(
        registry: Arc<AnalyzerRegistry>,
        events: EventBus,
        failure_threshold: u32,
        success_threshold: u32,
    ) -> Self {
        Self {
            registry,
            events,
            failure_threshold,
            success_threshold,
        }
    }

    /// Record one dispatch or probe outcome for the named analyzer.
    ///
    /// An outcome for an analyzer that has been evicted in the meantime is
    /// dropped without side effect.
    pub fn record_outcome(&self, id: &str, kind: OutcomeKind, success: bool, rtt_ms: u64) {
        let Some(analyzer) = self.registry.lookup(id) else {
            tracing::debug!(analyzer = %id, "Outcome for evicted analyzer dropped");
            return;
        };

        let transition = analyzer.record(
            kind,
            success,
            rtt_ms,
            self.failure_threshold,
            self.success_threshold,
        );

        match transition {
            Some(HealthTransition::Degraded) => {
                self.events
                    .publish(GatewayEvent::AnalyzerDegraded { id: id.to_string() });
            }
            Some(HealthTransition::Recovered) => {
                self.events
                    .publish(GatewayEvent::AnalyzerRecovered { id: id.to_string() });
            }
            None => {}
        }
    }
}
