// HTTP request handlers for the bridge relay API

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app_state::SharedState;
use crate::client::BINARY_CONTENT_TYPE;
use crate::models::{BridgeOperationsRequest, BridgeOperationsResponse};

// ===== BRIDGE SEND ENDPOINTS =====

/// `POST /bridge/send` with a JSON body
pub async fn send_bridge_operations(
    State(state): State<SharedState>,
    payload: Result<Json<BridgeOperationsRequest>, JsonRejection>,
) -> Result<Json<BridgeOperationsResponse>, (StatusCode, String)> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "malformed bridge request");
        (StatusCode::BAD_REQUEST, rejection.body_text())
    })?;

    Ok(Json(state.relay.relay(request).await))
}

/// Binary variant: bincode request in, bincode response out.
///
/// Reached through the content-type demux for `application/grpc*` bodies.
pub async fn send_bridge_operations_binary(state: SharedState, body: Bytes) -> Response {
    let request: BridgeOperationsRequest = match bincode::deserialize(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, bytes = body.len(), "malformed binary bridge request");
            return (StatusCode::BAD_REQUEST, format!("Invalid binary request: {}", e)).into_response();
        }
    };

    let response = state.relay.relay(request).await;
    match bincode::serialize(&response) {
        Ok(bytes) => ([(header::CONTENT_TYPE, BINARY_CONTENT_TYPE)], bytes).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Cannot encode response: {}", e)).into_response(),
    }
}

// ===== STATUS ENDPOINTS =====

pub async fn health_check() -> &'static str {
    "Sovereign Bridge Relay - Online ✅"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub service: String,
    pub version: String,
    pub chains: Vec<String>,
    pub started_at: String,
    pub uptime_secs: i64,
}

pub async fn get_status(State(state): State<SharedState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chains: state.chains().into_iter().map(String::from).collect(),
        started_at: state.started_at.to_rfc3339(),
        uptime_secs: state.uptime_secs(),
    })
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}
