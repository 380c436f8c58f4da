//! API error types and responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use iddoc_core::VerifyError;
use thiserror::Error;
use tracing::error;

use crate::api::response::{DocumentError, VerifyResponse};

/// API error type
///
/// Messages are what the caller sees. Internal detail is logged when the
/// error is converted, never carried here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApiError> for VerifyResponse {
    fn from(err: ApiError) -> Self {
        VerifyResponse::rejected(err.status(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        VerifyResponse::from(self).into_response()
    }
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        if err.is_internal() {
            error!(error = %err, "Internal fault while verifying document");
            ApiError::Internal("Internal verification error".into())
        } else if err.is_crypto_rejection() {
            ApiError::Forbidden(err.to_string())
        } else {
            ApiError::BadRequest(err.to_string())
        }
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
