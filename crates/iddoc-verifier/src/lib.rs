//! Identity Document Verifier
//!
//! HTTP front end for [`iddoc_core`]: every request body is one PEM-armored
//! PKCS#7 signed document. The server verifies it against the trust store
//! loaded at startup and answers with the signed payload or the reason it
//! was rejected.
//!
//! ## Status Codes
//!
//! - `200` - signature valid, signer trusted, `document` attached
//! - `400` - body unreadable, envelope malformed or document not representable
//! - `403` - signature invalid or signer not trusted
//! - `500` - internal fault
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check with trust store size
//! - `POST /` - Verify a signed document
//! - `POST /v1/verify` - Verify a signed document

pub mod api;
pub mod config;
pub mod service;

pub use api::create_router;
pub use api::error::ApiError;
pub use api::handlers::AppState;
pub use api::response::{DocumentEncoding, DocumentError, VerifyResponse};
pub use config::{Config, ConfigError};
pub use service::VerificationService;
