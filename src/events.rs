//! Typed lifecycle event channel.
//!
//! Registry and recorder publish analyzer lifecycle transitions on a
//! broadcast channel. Interested subsystems (the observability task, tests)
//! subscribe; publishing never blocks and drops events when nobody listens.

use tokio::sync::broadcast;

/// Analyzer lifecycle events emitted by the registry and the outcome
/// recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// An analyzer entered the registry (new or replaced).
    AnalyzerAdmitted { id: String },
    /// An analyzer was removed from the registry.
    AnalyzerEvicted { id: String },
    /// An analyzer crossed the failure threshold and left the healthy set.
    AnalyzerDegraded { id: String },
    /// An analyzer crossed the success threshold and rejoined the healthy set.
    AnalyzerRecovered { id: String },
}

/// Cloneable publish handle over the event channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GatewayEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. A send error only means there are no subscribers.
    pub fn publish(&self, event: GatewayEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Log every lifecycle event until the channel closes.
///
/// Spawned once at startup; this is the single place analyzer transitions
/// reach the log stream and the health gauge.
pub async fn run_event_logger(mut rx: broadcast::Receiver<GatewayEvent>) {
    loop {
        match rx.recv().await {
            Ok(GatewayEvent::AnalyzerAdmitted { id }) => {
                tracing::info!(analyzer = %id, "Analyzer admitted");
                crate::observability::metrics::record_analyzer_health(&id, true);
            }
            Ok(GatewayEvent::AnalyzerEvicted { id }) => {
                tracing::info!(analyzer = %id, "Analyzer evicted");
            }
            Ok(GatewayEvent::AnalyzerDegraded { id }) => {
                tracing::warn!(analyzer = %id, "Analyzer marked unhealthy");
                crate::observability::metrics::record_analyzer_health(&id, false);
            }
            Ok(GatewayEvent::AnalyzerRecovered { id }) => {
                tracing::info!(analyzer = %id, "Analyzer recovered");
                crate::observability::metrics::record_analyzer_health(&id, true);
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::debug!(missed, "Event logger lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
