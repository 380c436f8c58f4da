//! Verification response contract
//!
//! Every request produces exactly one [`VerifyResponse`]. The constructors
//! keep the body consistent: a document only on success, at least one error
//! only on failure.

use std::str::FromStr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Response body for a verification request
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    #[serde(skip)]
    status: StatusCode,

    success: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<Value>,
}

impl VerifyResponse {
    /// 200 response carrying the verified document
    pub fn verified(document: Value) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            errors: Vec::new(),
            document: Some(document),
        }
    }

    /// Failure response with a single error message
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            errors: vec![message.into()],
            document: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn document(&self) -> Option<&Value> {
        self.document.as_ref()
    }
}

impl IntoResponse for VerifyResponse {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// Error raised when verified content cannot be placed in the response
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Verified document is not valid JSON")]
    NotJson(#[source] serde_json::Error),
}

/// How the verified document is represented in the response body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentEncoding {
    /// Standard base64 string of the signed bytes
    #[default]
    Base64,
    /// The signed bytes embedded as a JSON value
    Json,
}

impl DocumentEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentEncoding::Base64 => "base64",
            DocumentEncoding::Json => "json",
        }
    }

    pub fn encode(&self, content: &[u8]) -> Result<Value, DocumentError> {
        match self {
            DocumentEncoding::Base64 => Ok(Value::String(STANDARD.encode(content))),
            DocumentEncoding::Json => {
                serde_json::from_slice(content).map_err(DocumentError::NotJson)
            }
        }
    }
}

impl FromStr for DocumentEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base64" => Ok(DocumentEncoding::Base64),
            "json" => Ok(DocumentEncoding::Json),
            other => Err(format!("unknown document encoding '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verified_body_shape() {
        let response = VerifyResponse::verified(Value::String("aGVsbG8=".into()));
        let body = serde_json::to_value(&response).unwrap();

        assert_eq!(body, serde_json::json!({ "success": true, "document": "aGVsbG8=" }));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_rejected_body_shape() {
        let response = VerifyResponse::rejected(StatusCode::FORBIDDEN, "Signature verification failed");
        let body = serde_json::to_value(&response).unwrap();

        assert_eq!(
            body,
            serde_json::json!({ "success": false, "errors": ["Signature verification failed"] })
        );
        assert!(response.document().is_none());
    }

    #[test]
    fn test_base64_encoding() {
        let value = DocumentEncoding::Base64.encode(b"hello").unwrap();
        assert_eq!(value, Value::String("aGVsbG8=".into()));
    }

    #[test]
    fn test_json_encoding() {
        let value = DocumentEncoding::Json
            .encode(br#"{"instanceId":"i-0abc","region":"us-east-1"}"#)
            .unwrap();
        assert_eq!(value["region"], "us-east-1");
    }

    #[test]
    fn test_json_encoding_rejects_non_json() {
        assert!(DocumentEncoding::Json.encode(b"hello").is_err());
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("base64".parse::<DocumentEncoding>(), Ok(DocumentEncoding::Base64));
        assert_eq!("JSON".parse::<DocumentEncoding>(), Ok(DocumentEncoding::Json));
        assert!("yaml".parse::<DocumentEncoding>().is_err());
        assert_eq!(
            DocumentEncoding::Json.as_str().parse::<DocumentEncoding>(),
            Ok(DocumentEncoding::Json)
        );
    }
}
