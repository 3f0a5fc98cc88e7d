//! Log ingestion-and-dispatch gateway.
//!
//! Upstream agents POST packets of log messages to `/logs`; the gateway
//! buffers them in a bounded queue and fans each message out to exactly
//! one downstream analyzer, chosen weight-proportionally among the
//! analyzers currently believed healthy.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌────────────────────────────────────────────────┐
//!                       │                   GATEWAY                       │
//!   POST /logs          │  ┌────────┐   ┌─────────┐   ┌──────────────┐   │
//!   ────────────────────┼─▶│  http  │──▶│dispatch │──▶│  dispatch    │   │
//!                       │  │ ingest │   │  queue  │   │  worker(s)   │   │
//!   429 when saturated  │  └────────┘   └─────────┘   └──────┬───────┘   │
//!                       │                                     │           │
//!                       │                              ┌──────▼───────┐   │      POST /analyze
//!                       │                              │   weighted   │───┼────▶ analyzer pool
//!                       │                              │   selector   │   │
//!                       │                              └──────────────┘   │
//!                       │  ┌────────────────────────────────────────────┐ │
//!                       │  │            Cross-Cutting Concerns           │ │
//!                       │  │  registry · health prober/recorder · stats │ │
//!                       │  │  config · events · observability · lifecycle│ │
//!                       │  └────────────────────────────────────────────┘ │
//!                       └────────────────────────────────────────────────┘
//! ```
//!
//! Analyzer liveness is tracked by a 3-strikes state machine fed by both
//! dispatch outcomes and periodic active probes; unhealthy analyzers are
//! excluded from selection until they recover.

// Core subsystems
pub mod config;
pub mod dispatch;
pub mod http;
pub mod model;
pub mod registry;

// Health tracking
pub mod health;

// Cross-cutting concerns
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod observability;
pub mod stats;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
