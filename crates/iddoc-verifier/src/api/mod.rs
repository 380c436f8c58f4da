//! API module for the verifier server

pub mod error;
pub mod handlers;
pub mod response;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use handlers::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness check response
#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub trusted_certificates: usize,
    pub document_encoding: String,
    pub max_body_bytes: usize,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Readiness check endpoint
///
/// GET /ready
pub async fn ready(State(state): State<Arc<AppState>>) -> Json<ReadyResponse> {
    let trusted = state.service.trust().len();

    Json(ReadyResponse {
        ready: trusted > 0,
        trusted_certificates: trusted,
        document_encoding: state.config.document_encoding.as_str().into(),
        max_body_bytes: state.config.max_body_bytes,
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Verification endpoints
        .route("/", post(handlers::verify_document))
        .route("/v1/verify", post(handlers::verify_document))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
