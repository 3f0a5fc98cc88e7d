//! Log submission endpoint.
//!
//! Accepts both ingress shapes, normalizes them into a packet, and hands
//! the packet to the dispatch queue. The handler never waits on the queue:
//! saturation surfaces immediately as 429.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::model::LogSubmission;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestAccepted {
    success: bool,
    packet_id: String,
    message_count: usize,
    timestamp: DateTime<Utc>,
}

/// `POST /logs`
pub async fn submit_logs(State(state): State<AppState>, body: Bytes) -> Response {
    let submission: LogSubmission = match serde_json::from_slice(&body) {
        Ok(submission) => submission,
        Err(error) => {
            tracing::debug!(%error, "Rejected malformed log packet");
            return invalid_packet(None);
        }
    };

    let packet = match submission.into_packet() {
        Ok(packet) => packet,
        Err(error) => {
            tracing::debug!(%error, "Rejected invalid log packet");
            return invalid_packet(None);
        }
    };

    let packet_id = packet.id.clone();
    let message_count = packet.messages.len();

    state.stats.record_packet_received();
    match state.queue.try_enqueue(packet) {
        Ok(()) => (
            StatusCode::OK,
            Json(IngestAccepted {
                success: true,
                packet_id,
                message_count,
                timestamp: Utc::now(),
            }),
        )
            .into_response(),
        Err(error @ (GatewayError::QueueFull { .. } | GatewayError::Shutdown)) => {
            // The packet was counted received, so the rejection must be
            // counted dropped to keep the aggregate ledger balanced.
            state.stats.record_packets_dropped(1);
            tracing::warn!(packet = %packet_id, %error, "Log packet rejected");
            error.into_response()
        }
        Err(error) => error.into_response(),
    }
}

fn invalid_packet(packet_id: Option<&str>) -> Response {
    let body = match packet_id {
        Some(id) => json!({ "error": "Invalid log packet", "packetId": id }),
        None => json!({ "error": "Invalid log packet" }),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}
