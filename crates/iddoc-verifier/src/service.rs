//! Verification Service
//!
//! Drives one [`VerificationRequest`] from raw body to [`VerifyResponse`].
//! Every failure is recovered here; the caller always gets exactly one
//! response.

use axum::body::Body;
use iddoc_core::{TrustStore, VerificationRequest, VerifyError};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::error::ApiError;
use crate::api::response::{DocumentEncoding, VerifyResponse};
use crate::config::Config;

/// Verifies signed documents against a fixed trust store
#[derive(Debug, Clone)]
pub struct VerificationService {
    trust: TrustStore,
    encoding: DocumentEncoding,
    max_body_bytes: usize,
}

impl VerificationService {
    pub fn new(trust: TrustStore, encoding: DocumentEncoding, max_body_bytes: usize) -> Self {
        Self {
            trust,
            encoding,
            max_body_bytes,
        }
    }

    pub fn from_config(config: &Config, trust: TrustStore) -> Self {
        Self::new(trust, config.document_encoding, config.max_body_bytes)
    }

    pub fn trust(&self) -> &TrustStore {
        &self.trust
    }

    /// Read a request body and verify it
    ///
    /// A body longer than the configured limit, or one the client abandons
    /// mid-read, fails the read step.
    pub async fn handle(&self, body: Body) -> VerifyResponse {
        match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => self.handle_bytes(&bytes),
            Err(e) => self.reject(ApiError::from(VerifyError::Io(e.to_string()))),
        }
    }

    /// Verify an already buffered body
    pub fn handle_bytes(&self, body: &[u8]) -> VerifyResponse {
        match self.run(body) {
            Ok(document) => {
                info!(len = body.len(), "Signed document verified");
                VerifyResponse::verified(document)
            }
            Err(err) => self.reject(err),
        }
    }

    fn run(&self, body: &[u8]) -> Result<Value, ApiError> {
        let mut request = VerificationRequest::new();

        request.load(body)?;
        request.decode(&self.trust)?;
        debug!(stage = ?request.stage(), "Envelope decoded");

        request.verify()?;
        let document = self.encoding.encode(request.content()?)?;
        Ok(document)
    }

    fn reject(&self, err: ApiError) -> VerifyResponse {
        warn!(status = %err.status(), error = %err, "Rejected signed document");
        VerifyResponse::from(err)
    }
}
