// Routes module - builds the HTTP surface of the relay
//
// One socket serves both encodings: requests whose content type starts with
// `application/grpc` are diverted to the binary handler before routing.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app_state::SharedState;
use crate::handlers::*;

/// Content-type prefix that selects the binary handler
pub const BINARY_CONTENT_TYPE_PREFIX: &str = "application/grpc";

/// Largest accepted binary body
pub const MAX_BINARY_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // ===== BRIDGE ENDPOINTS =====
        .route("/bridge/send", post(send_bridge_operations))

        // ===== HEALTH / STATUS =====
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .fallback(not_found)

        // Content-type demux, request tracing and CORS
        .layer(middleware::from_fn_with_state(state.clone(), binary_demux))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

fn is_binary_request(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with(BINARY_CONTENT_TYPE_PREFIX))
        .unwrap_or(false)
}

async fn binary_demux(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    if !is_binary_request(&request) {
        return next.run(request).await;
    }

    let body: Body = request.into_body();
    match axum::body::to_bytes(body, MAX_BINARY_BODY_BYTES).await {
        Ok(bytes) => send_bridge_operations_binary(state, bytes).await,
        Err(e) => (StatusCode::BAD_REQUEST, format!("Cannot read request body: {}", e)).into_response(),
    }
}
