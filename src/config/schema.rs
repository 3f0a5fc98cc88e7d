//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits so they deserialize from an
//! optional TOML file; environment variables override individual fields
//! afterwards.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Ingress HTTP server settings.
    pub server: ServerConfig,

    /// Dispatch queue settings.
    pub queue: QueueConfig,

    /// Outbound dispatch settings.
    pub dispatch: DispatchConfig,

    /// Active health probing settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Analyzers admitted at startup.
    pub analyzers: Vec<AnalyzerConfig>,
}

/// Ingress server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Ingress port; the server binds 0.0.0.0.
    pub port: u16,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,

    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            max_body_bytes: 2 * 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Dispatch queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queue capacity; enqueues beyond this are rejected with 429.
    pub max_queue_size: usize,

    /// Maximum packets a worker takes per drain.
    pub batch_size: usize,

    /// Worker wake-up tick in milliseconds, bounding latency when enqueue
    /// signals are coalesced.
    pub processing_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 10_000,
            batch_size: 100,
            processing_interval_ms: 10,
        }
    }
}

/// Outbound dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Per-message send timeout in milliseconds.
    pub send_timeout_ms: u64,

    /// Retry a failed message once on a different analyzer. Off by
    /// default: delivery is at-most-once.
    pub retry_on_failure: bool,

    /// Number of dispatch workers draining the queue.
    pub worker_count: usize,

    /// Grace period for draining the queue on shutdown, in milliseconds.
    pub shutdown_grace_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: 5_000,
            retry_on_failure: false,
            worker_count: 2,
            shutdown_grace_ms: 10_000,
        }
    }
}

/// Health probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Probe sweep interval in milliseconds.
    pub interval_ms: u64,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Consecutive failures before marking unhealthy.
    pub failure_threshold: u32,

    /// Consecutive successes before marking healthy again.
    pub success_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            timeout_ms: 5_000,
            failure_threshold: 3,
            success_threshold: 3,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One analyzer admitted at startup.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AnalyzerConfig {
    /// Unique analyzer identifier.
    pub id: String,

    /// Absolute base URL of the analyzer.
    pub endpoint: String,

    /// Weight for weighted selection (default: 1).
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}
