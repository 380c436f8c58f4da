//! Document Verification Handler

use axum::{body::Body, extract::State};
use std::sync::Arc;

use crate::api::response::VerifyResponse;
use crate::config::Config;
use crate::service::VerificationService;

/// Application state shared across handlers
pub struct AppState {
    /// Verification pipeline and its trust store
    pub service: VerificationService,
    /// Runtime configuration
    pub config: Config,
}

impl AppState {
    pub fn new(service: VerificationService, config: Config) -> Self {
        Self { service, config }
    }
}

/// Verify a PEM-armored PKCS#7 signed document
///
/// POST /
/// POST /v1/verify
///
/// The whole request body is the envelope.
pub async fn verify_document(State(state): State<Arc<AppState>>, body: Body) -> VerifyResponse {
    state.service.handle(body).await
}
