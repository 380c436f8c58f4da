//! Error types for envelope verification and trust store construction

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using VerifyError
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Errors raised while processing one verification request
///
/// Messages are safe to return to the caller: they never carry decoder or
/// library internals. Detail is logged where the error is created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The request body could not be read to completion
    #[error("Error reading request body: {0}")]
    Io(String),

    /// PEM armor or binary structure is invalid, or required fields are missing
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The signature does not verify over the signed content
    #[error("Signature verification failed")]
    SignatureInvalid,

    /// The signature may be valid but the signer is not a trusted certificate
    #[error("Signer is not a trusted certificate")]
    UntrustedSigner,

    /// A lifecycle operation was called out of order
    #[error("Invalid request state: {0}")]
    InvalidState(String),

    /// The crypto backend failed for reasons unrelated to the input
    #[error("Internal verification error: {0}")]
    Internal(String),
}

impl VerifyError {
    /// True for rejections that come from the cryptographic check itself
    pub fn is_crypto_rejection(&self) -> bool {
        matches!(self, VerifyError::SignatureInvalid | VerifyError::UntrustedSigner)
    }

    /// True for faults that indicate a bug or backend failure, not bad input
    pub fn is_internal(&self) -> bool {
        matches!(self, VerifyError::InvalidState(_) | VerifyError::Internal(_))
    }
}

impl From<std::io::Error> for VerifyError {
    fn from(err: std::io::Error) -> Self {
        VerifyError::Io(err.to_string())
    }
}

/// Errors raised while building the trust store at startup
#[derive(Error, Debug)]
pub enum TrustError {
    /// A configured certificate is not valid PEM or not a valid certificate
    #[error("Malformed certificate: {0}")]
    MalformedCertificate(String),

    /// A configured certificate file could not be read
    #[error("Failed to read certificate {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No certificates were configured
    #[error("Trust store has no certificates")]
    Empty,

    /// OpenSSL failed outside of certificate decoding
    #[error("Crypto backend error: {0}")]
    Crypto(String),
}

impl From<openssl::error::ErrorStack> for TrustError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        TrustError::Crypto(err.to_string())
    }
}
