//! HTTP server setup and gateway orchestration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Construct the dispatch engine and its shared dependencies
//! - Spawn workers and the health prober alongside the server
//! - Drive the graceful shutdown sequence

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::dispatch::queue::DispatchQueue;
use crate::dispatch::selector::WeightedSelector;
use crate::dispatch::worker::{DispatchContext, DispatchWorker};
use crate::error::GatewayError;
use crate::events::{self, EventBus};
use crate::health::prober::HealthProber;
use crate::health::recorder::OutcomeRecorder;
use crate::http::{admin, ingest};
use crate::lifecycle::Shutdown;
use crate::registry::AnalyzerRegistry;
use crate::stats::GatewayStats;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AnalyzerRegistry>,
    pub queue: Arc<DispatchQueue>,
    pub stats: Arc<GatewayStats>,
    pub prober: Arc<HealthProber>,
}

/// The assembled gateway: HTTP surface plus dispatch engine.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
    ctx: DispatchContext,
    events: EventBus,
}

impl HttpServer {
    /// Construct the gateway from configuration.
    ///
    /// Admits the configured analyzers and builds the shared HTTP client,
    /// queue, selector, recorder and prober. Nothing is spawned until
    /// [`run`](Self::run).
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let events = EventBus::default();
        let registry = Arc::new(AnalyzerRegistry::new(events.clone()));
        for analyzer in &config.analyzers {
            registry.admit(&analyzer.id, &analyzer.endpoint, analyzer.weight)?;
        }

        // One pool for dispatches and probes, keyed by analyzer host.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| GatewayError::InvalidArgument(format!("failed to build HTTP client: {e}")))?;

        let queue = Arc::new(DispatchQueue::new(config.queue.max_queue_size));
        let stats = Arc::new(GatewayStats::new());
        let recorder = Arc::new(OutcomeRecorder::new(
            registry.clone(),
            events.clone(),
            config.health_check.failure_threshold,
            config.health_check.success_threshold,
        ));
        let prober = Arc::new(HealthProber::new(
            registry.clone(),
            recorder.clone(),
            client.clone(),
            Duration::from_millis(config.health_check.interval_ms),
            Duration::from_millis(config.health_check.timeout_ms),
        ));

        let ctx = DispatchContext {
            queue: queue.clone(),
            registry: registry.clone(),
            selector: Arc::new(WeightedSelector::new()),
            recorder,
            client,
            stats: stats.clone(),
            batch_size: config.queue.batch_size,
            processing_interval: Duration::from_millis(config.queue.processing_interval_ms),
            send_timeout: Duration::from_millis(config.dispatch.send_timeout_ms),
            retry_on_failure: config.dispatch.retry_on_failure,
        };

        let state = AppState {
            registry,
            queue,
            stats,
            prober,
        };
        let router = Self::build_router(&config, state.clone());

        Ok(Self {
            router,
            config,
            state,
            ctx,
            events,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/logs", post(ingest::submit_logs))
            .route("/health", get(admin::get_health))
            .route("/ready", get(admin::get_ready))
            .route("/stats", get(admin::get_stats))
            .route(
                "/analyzers",
                get(admin::get_analyzers).post(admin::admit_analyzer),
            )
            .route("/analyzers/{id}", delete(admin::evict_analyzer))
            .route("/analyzers/{id}/health", post(admin::trigger_probe))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the gateway until `shutdown` is triggered, then drain.
    ///
    /// Shutdown sequence: stop accepting requests, close the queue, let
    /// workers drain for the grace period, count leftovers as dropped,
    /// then stop the prober and workers.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            analyzers = self.state.registry.len(),
            workers = self.config.dispatch.worker_count,
            "Gateway listening"
        );

        tokio::spawn(events::run_event_logger(self.events.subscribe()));

        // Workers and the prober outlive the ingress: they get their own
        // stop signal, triggered only after the drain phase.
        let stop = Shutdown::new();
        tokio::spawn(self.state.prober.clone().run(stop.subscribe()));

        let mut workers = Vec::with_capacity(self.config.dispatch.worker_count);
        for worker_id in 0..self.config.dispatch.worker_count {
            let worker = DispatchWorker::new(worker_id, self.ctx.clone());
            workers.push(tokio::spawn(worker.run(stop.subscribe())));
        }

        let mut quiesce = shutdown.subscribe();
        let app = self.router.into_make_service();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = quiesce.recv().await;
            })
            .await?;

        // Ingress has stopped; give queued packets the grace period.
        self.state.queue.close();
        let grace = Duration::from_millis(self.config.dispatch.shutdown_grace_ms);
        let deadline = tokio::time::Instant::now() + grace;
        while !self.state.queue.is_empty() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let leftover = self.state.queue.drain_remaining();
        if !leftover.is_empty() {
            self.state.stats.record_packets_dropped(leftover.len() as u64);
            tracing::warn!(
                packets = leftover.len(),
                "Grace period expired with packets still queued"
            );
        }

        stop.trigger();
        for handle in workers {
            let _ = handle.await;
        }

        tracing::info!("Gateway stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
