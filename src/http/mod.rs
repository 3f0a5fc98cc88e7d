//! HTTP surface of the gateway.
//!
//! # Responsibilities
//! - Accept log packets on `POST /logs` (ingest.rs)
//! - Serve the administrative endpoints (admin.rs)
//! - Wire the Axum router, middleware and background tasks (server.rs)
//! - Map `GatewayError` kinds onto status codes and JSON bodies

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::GatewayError;

pub mod admin;
pub mod ingest;
pub mod server;

pub use server::{AppState, HttpServer};

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::InvalidArgument(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": message })),
            )
                .into_response(),
            GatewayError::QueueFull { capacity } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": "Service temporarily unavailable",
                    "message": format!("Queue full (capacity {capacity})"),
                })),
            )
                .into_response(),
            GatewayError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("analyzer not found: {id}") })),
            )
                .into_response(),
            GatewayError::Shutdown => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "Service temporarily unavailable",
                    "message": "Gateway is shutting down",
                })),
            )
                .into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
        }
    }
}
