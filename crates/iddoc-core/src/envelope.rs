//! PKCS#7 signed-data envelopes
//!
//! Decoding runs inside the [`fault`](crate::fault) boundary because every
//! byte comes from the caller. Verification resolves the signer against the
//! trust store only; certificates embedded in the envelope never establish
//! trust on their own.

use std::cmp::Ordering;
use std::fmt;

use openssl::error::ErrorStack;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::x509::{X509Ref, X509};
use tracing::{debug, error, warn};

use crate::error::{Result, VerifyError};
use crate::fault;
use crate::pem;
use crate::trust::TrustStore;

const REASON_NO_SIGNERS: &str = "no signers";
const REASON_WRONG_CONTENT_TYPE: &str = "wrong content type";
const REASON_NO_CONTENT: &str = "no content";

/// A decoded, not yet verified, signed-data envelope
pub struct Envelope {
    pkcs7: Pkcs7,
    der: Vec<u8>,
}

impl Envelope {
    /// Extract the first PEM block from `raw` and parse it as PKCS#7
    pub fn decode(raw: &[u8]) -> Result<Self> {
        fault::isolate("decode", || {
            let der = pem::first_block(raw).ok_or_else(|| {
                warn!(len = raw.len(), "Request body has no PEM block");
                VerifyError::MalformedEnvelope("no PEM block found".into())
            })?;
            Self::from_der(&der)
        })
    }

    /// Parse a binary PKCS#7 structure
    pub fn from_der(der: &[u8]) -> Result<Self> {
        fault::isolate("decode", || {
            let pkcs7 = Pkcs7::from_der(der).map_err(|e| {
                warn!(error = %e, len = der.len(), "Failed to parse PKCS7 structure");
                malformed("invalid PKCS7 structure")
            })?;
            // Re-encode so equality compares structure, not input framing.
            let der = pkcs7.to_der().map_err(|e| {
                error!(error = %e, "Failed to re-encode PKCS7 structure");
                malformed("invalid PKCS7 structure")
            })?;
            Ok(Self { pkcs7, der })
        })
    }

    /// True when the envelope carries a signed-data body
    pub fn is_signed_data(&self) -> bool {
        self.pkcs7.signed().is_some()
    }

    /// Certificates the sender embedded in the envelope
    pub fn embedded_certificates(&self) -> Vec<X509> {
        self.pkcs7
            .signed()
            .and_then(|signed| signed.certificates())
            .map(|certs| certs.iter().map(|c| c.to_owned()).collect())
            .unwrap_or_default()
    }

    /// Check the signature against `trust` and return the signed content
    ///
    /// Exactly one signer info is accepted. The signer must resolve to a
    /// trusted certificate by issuer and serial, and any embedded certificate
    /// claiming that identity must carry the same public key.
    pub fn verify(&self, trust: &TrustStore) -> Result<Vec<u8>> {
        fault::isolate("verify", || self.verify_inner(trust))
    }

    fn verify_inner(&self, trust: &TrustStore) -> Result<Vec<u8>> {
        let signed = self
            .pkcs7
            .signed()
            .ok_or_else(|| malformed("envelope is not PKCS7 signed data"))?;

        let candidates = trust.candidate_stack().map_err(internal)?;

        let signers = self
            .pkcs7
            .signers(&candidates, Pkcs7Flags::NOINTERN)
            .map_err(|e| signer_error(&e))?;

        let signer = match signers.len() {
            1 => signers.get(0).ok_or_else(|| malformed("envelope has no signer info"))?,
            0 => return Err(malformed("envelope has no signer info")),
            n => {
                warn!(signers = n, "Rejecting envelope with multiple signers");
                return Err(malformed("envelope must have exactly one signer"));
            }
        };

        if let Some(embedded) = signed.certificates() {
            for certificate in embedded {
                if same_identity(certificate, signer).map_err(internal)?
                    && !same_key(certificate, signer).map_err(internal)?
                {
                    warn!("Embedded certificate claims a trusted identity with a different key");
                    return Err(VerifyError::UntrustedSigner);
                }
            }
        }

        let mut content = Vec::new();
        self.pkcs7
            .verify(
                &candidates,
                trust.verify_store(),
                None,
                Some(&mut content),
                Pkcs7Flags::NOINTERN | Pkcs7Flags::NOVERIFY,
            )
            .map_err(|e| signature_error(&e))?;

        debug!(len = content.len(), "Envelope signature verified");
        Ok(content)
    }
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Envelope {}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("der_len", &self.der.len())
            .field("signed_data", &self.is_signed_data())
            .finish()
    }
}

fn same_identity(a: &X509Ref, b: &X509Ref) -> std::result::Result<bool, ErrorStack> {
    if a.issuer_name().try_cmp(b.issuer_name())? != Ordering::Equal {
        return Ok(false);
    }
    Ok(a.serial_number().to_bn()? == b.serial_number().to_bn()?)
}

fn same_key(a: &X509Ref, b: &X509Ref) -> std::result::Result<bool, ErrorStack> {
    let a_key = a.public_key()?;
    let b_key = b.public_key()?;
    Ok(a_key.public_eq(&*b_key))
}

fn has_reason(err: &ErrorStack, reason: &str) -> bool {
    err.errors()
        .iter()
        .any(|e| e.reason().is_some_and(|r| r.eq_ignore_ascii_case(reason)))
}

fn signer_error(err: &ErrorStack) -> VerifyError {
    if has_reason(err, REASON_NO_SIGNERS) {
        return malformed("envelope has no signer info");
    }
    if has_reason(err, REASON_WRONG_CONTENT_TYPE) {
        return malformed("envelope is not PKCS7 signed data");
    }
    warn!(error = %err, "Signer does not resolve to a trusted certificate");
    VerifyError::UntrustedSigner
}

fn signature_error(err: &ErrorStack) -> VerifyError {
    if has_reason(err, REASON_NO_CONTENT) {
        return malformed("envelope carries no signed content");
    }
    warn!(error = %err, "Envelope signature does not verify");
    VerifyError::SignatureInvalid
}

fn internal(err: ErrorStack) -> VerifyError {
    error!(error = %err, "OpenSSL failure during verification");
    VerifyError::Internal("crypto backend failure".into())
}

fn malformed(message: &str) -> VerifyError {
    VerifyError::MalformedEnvelope(message.into())
}
