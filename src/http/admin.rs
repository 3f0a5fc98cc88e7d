//! Administrative endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::registry::AnalyzerSnapshot;
use crate::stats::StatsSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyStatus {
    pub ready: bool,
    pub healthy_analyzers: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    #[serde(flatten)]
    pub aggregate: StatsSnapshot,
    pub queue_size: usize,
    pub healthy_analyzers: usize,
    pub analyzers: Vec<AnalyzerSnapshot>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmitRequest {
    pub id: String,
    pub endpoint: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvictResponse {
    pub id: String,
    pub evicted: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResponse {
    pub id: String,
    pub healthy: bool,
    pub last_response_time_ms: u64,
}

/// `GET /health`: gateway liveness.
pub async fn get_health() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// `GET /ready`: 200 iff at least one analyzer is healthy.
pub async fn get_ready(State(state): State<AppState>) -> Response {
    let healthy_analyzers = state.registry.healthy_count();
    let status = if healthy_analyzers > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ReadyStatus {
            ready: healthy_analyzers > 0,
            healthy_analyzers,
        }),
    )
        .into_response()
}

/// `GET /stats`: aggregate counters plus the per-analyzer snapshot.
pub async fn get_stats(State(state): State<AppState>) -> Json<GatewayStatus> {
    Json(GatewayStatus {
        aggregate: state.stats.snapshot(),
        queue_size: state.queue.len(),
        healthy_analyzers: state.registry.healthy_count(),
        analyzers: state.registry.snapshot(),
    })
}

/// `GET /analyzers`
pub async fn get_analyzers(State(state): State<AppState>) -> Json<Vec<AnalyzerSnapshot>> {
    Json(state.registry.snapshot())
}

/// `POST /analyzers`
pub async fn admit_analyzer(
    State(state): State<AppState>,
    Json(request): Json<AdmitRequest>,
) -> Result<Json<AnalyzerSnapshot>, GatewayError> {
    let snapshot = state
        .registry
        .admit(&request.id, &request.endpoint, request.weight)?;
    Ok(Json(snapshot))
}

/// `DELETE /analyzers/{id}`: idempotent eviction.
pub async fn evict_analyzer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<EvictResponse> {
    let evicted = state.registry.evict(&id);
    Json(EvictResponse { id, evicted })
}

/// `POST /analyzers/{id}/health`: run one probe synchronously.
pub async fn trigger_probe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProbeResponse>, GatewayError> {
    let snapshot = state.prober.trigger_probe(&id).await?;
    Ok(Json(ProbeResponse {
        id: snapshot.id,
        healthy: snapshot.healthy,
        last_response_time_ms: snapshot.last_response_time_ms,
    }))
}
