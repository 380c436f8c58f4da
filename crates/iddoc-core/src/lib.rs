//! # iddoc-core
//!
//! Verification of signed identity documents: PEM-armored PKCS#7 `SignedData`
//! envelopes checked against a fixed set of trusted signing certificates.
//!
//! ## Key Concepts
//!
//! - **TrustStore**: the read-only set of trusted certificates, built once at
//!   startup with a [`TrustStoreBuilder`]
//! - **Envelope**: a decoded PKCS#7 structure (signer info, embedded
//!   certificates, signed content, signature)
//! - **VerificationRequest**: one document's lifecycle, from raw bytes to
//!   verified content
//!
//! ## Trust Rules
//!
//! 1. Exactly one signer info per envelope
//! 2. The signer resolves to a trusted certificate by issuer and serial
//! 3. Embedded certificates never establish trust, and one that claims the
//!    signer's identity must carry the trusted public key
//!
//! Decoding attacker-controlled bytes runs behind a panic boundary; see
//! [`fault`].

pub mod envelope;
pub mod error;
pub mod fault;
pub mod pem;
pub mod request;
pub mod trust;

pub use envelope::Envelope;
pub use error::{Result, TrustError, VerifyError};
pub use request::{Stage, VerificationRequest};
pub use trust::{CertificateSummary, TrustStore, TrustStoreBuilder, AMAZON_PUBLIC_CLOUD_CERT};
