//! HTTP routes for the gateway.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                    - Service banner
//! GET  /health              - Liveness check
//! POST /api/punchout/setup  - PunchOutSetupRequest -> PunchOutSetupResponse (XML)
//! POST /api/punchout/order  - Storefront cart -> PunchOutOrderMessage (JSON envelope)
//! ```

pub mod punchout;

use axum::{
    Json, Router,
    body::Body,
    http::Request,
    middleware::from_fn,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Name reported by the service banner.
pub const SERVICE_NAME: &str = "PunchOut Bridge";

/// Build the application router with tracing and request IDs.
///
/// Sentry layers are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/punchout/setup", post(punchout::setup))
        .route("/api/punchout/order", post(punchout::order))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(
                    |request: &Request<Body>| {
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = tracing::field::Empty,
                        )
                    },
                ))
                .layer(from_fn(request_id_middleware)),
        )
        .with_state(state)
}

async fn index() -> Json<Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

/// Liveness health check. Does not check the commerce backend.
async fn health() -> &'static str {
    "ok"
}
