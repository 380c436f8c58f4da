//! Trusted signing certificates
//!
//! A [`TrustStoreBuilder`] collects certificates at startup. [`build`] freezes
//! them into a [`TrustStore`], a cheaply cloneable read-only snapshot that
//! request handlers share without locking.
//!
//! Configured certificates are trusted directly. No CA chain is walked.
//!
//! [`build`]: TrustStoreBuilder::build

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use openssl::error::ErrorStack;
use openssl::nid::Nid;
use openssl::stack::Stack;
use openssl::x509::store::{X509Store, X509StoreBuilder, X509StoreRef};
use openssl::x509::{X509NameRef, X509};
use tracing::info;

use crate::error::TrustError;
use crate::pem;

/// Public certificate AWS uses to sign EC2 instance identity documents
/// in the public cloud partition
pub const AMAZON_PUBLIC_CLOUD_CERT: &[u8] = b"-----BEGIN CERTIFICATE-----
MIIC7TCCAq0CCQCWukjZ5V4aZzAJBgcqhkjOOAQDMFwxCzAJBgNVBAYTAlVTMRkw
FwYDVQQIExBXYXNoaW5ndG9uIFN0YXRlMRAwDgYDVQQHEwdTZWF0dGxlMSAwHgYD
VQQKExdBbWF6b24gV2ViIFNlcnZpY2VzIExMQzAeFw0xMjAxMDUxMjU2MTJaFw0z
ODAxMDUxMjU2MTJaMFwxCzAJBgNVBAYTAlVTMRkwFwYDVQQIExBXYXNoaW5ndG9u
IFN0YXRlMRAwDgYDVQQHEwdTZWF0dGxlMSAwHgYDVQQKExdBbWF6b24gV2ViIFNl
cnZpY2VzIExMQzCCAbcwggEsBgcqhkjOOAQBMIIBHwKBgQCjkvcS2bb1VQ4yt/5e
ih5OO6kK/n1Lzllr7D8ZwtQP8fOEpp5E2ng+D6Ud1Z1gYipr58Kj3nssSNpI6bX3
VyIQzK7wLclnd/YozqNNmgIyZecN7EglK9ITHJLP+x8FtUpt3QbyYXJdmVMegN6P
hviYt5JH/nYl4hh3Pa1HJdskgQIVALVJ3ER11+Ko4tP6nwvHwh6+ERYRAoGBAI1j
k+tkqMVHuAFcvAGKocTgsjJem6/5qomzJuKDmbJNu9Qxw3rAotXau8Qe+MBcJl/U
hhy1KHVpCGl9fueQ2s6IL0CaO/buycU1CiYQk40KNHCcHfNiZbdlx1E9rpUp7bnF
lRa2v1ntMX3caRVDdbtPEWmdxSCYsYFDk4mZrOLBA4GEAAKBgEbmeve5f8LIE/Gf
MNmP9CM5eovQOGx5ho8WqD+aTebs+k2tn92BBPqeZqpWRa5P/+jrdKml1qx4llHW
MXrs3IgIb6+hUIB+S8dz8/mmO0bpr76RoZVCXYab2CZedFut7qc3WUH9+EUAH5mw
vSeDCOUMYQR7R9LINYwouHIziqQYMAkGByqGSM44BAMDLwAwLAIUWXBlk40xTwSw
7HX32MxXYruse9ACFBNGmdX2ZBrVNGrN9N2f6ROk0k9K
-----END CERTIFICATE-----
";

/// Identity fields of a trusted certificate, for audit logs and readiness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    pub common_name: String,
    pub organization: String,
    pub province: String,
    pub country: String,
    pub not_before: String,
    pub not_after: String,
}

impl CertificateSummary {
    pub fn of(certificate: &X509) -> Self {
        let subject = certificate.subject_name();
        Self {
            common_name: name_field(subject, Nid::COMMONNAME),
            organization: name_field(subject, Nid::ORGANIZATIONNAME),
            province: name_field(subject, Nid::STATEORPROVINCENAME),
            country: name_field(subject, Nid::COUNTRYNAME),
            not_before: certificate.not_before().to_string(),
            not_after: certificate.not_after().to_string(),
        }
    }
}

impl fmt::Display for CertificateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.common_name, self.organization, self.province, self.country
        )
    }
}

// Raw string bytes, so interior NULs cannot cut the value short.
fn name_field(name: &X509NameRef, nid: Nid) -> String {
    name.entries_by_nid(nid)
        .map(|entry| String::from_utf8_lossy(entry.data().as_slice()).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Collects trusted certificates during startup
#[derive(Default)]
pub struct TrustStoreBuilder {
    certificates: Vec<X509>,
}

impl TrustStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a decoded certificate to the signing candidates
    pub fn add_certificate(&mut self, certificate: X509) -> &mut Self {
        let summary = CertificateSummary::of(&certificate);
        info!(
            common_name = %summary.common_name,
            organization = %summary.organization,
            province = %summary.province,
            country = %summary.country,
            not_before = %summary.not_before,
            not_after = %summary.not_after,
            "Adding certificate to signing candidates"
        );
        self.certificates.push(certificate);
        self
    }

    /// Decode the first PEM block in `data` as a certificate and add it
    pub fn add_pem_certificate(&mut self, data: &[u8]) -> Result<&mut Self, TrustError> {
        let der = pem::first_block(data)
            .ok_or_else(|| TrustError::MalformedCertificate("no PEM block found".into()))?;
        let certificate = X509::from_der(&der)
            .map_err(|e| TrustError::MalformedCertificate(e.to_string()))?;
        Ok(self.add_certificate(certificate))
    }

    /// Read a PEM certificate file and add it
    pub fn read_pem_certificate(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<&mut Self, TrustError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading certificate");

        let data = std::fs::read(path).map_err(|source| TrustError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_pem_certificate(&data)
    }

    /// Add the embedded AWS public cloud certificate
    pub fn add_amazon_public_cloud(&mut self) -> Result<&mut Self, TrustError> {
        self.add_pem_certificate(AMAZON_PUBLIC_CLOUD_CERT)
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Freeze the collected certificates
    ///
    /// Fails with [`TrustError::Empty`] when nothing was added.
    pub fn build(self) -> Result<TrustStore, TrustError> {
        if self.certificates.is_empty() {
            return Err(TrustError::Empty);
        }

        // Chains are never walked, so the verification store stays empty.
        let verify_store = X509StoreBuilder::new()?.build();

        info!(count = self.certificates.len(), "Trust store ready");

        Ok(TrustStore {
            inner: Arc::new(Inner {
                certificates: self.certificates,
                verify_store,
            }),
        })
    }
}

/// Read-only set of trusted signing certificates
#[derive(Clone)]
pub struct TrustStore {
    inner: Arc<Inner>,
}

struct Inner {
    certificates: Vec<X509>,
    verify_store: X509Store,
}

impl TrustStore {
    /// Certificates a verification attempt may resolve its signer to,
    /// in insertion order
    pub fn candidates(&self) -> &[X509] {
        &self.inner.certificates
    }

    pub fn len(&self) -> usize {
        self.inner.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.certificates.is_empty()
    }

    pub fn summaries(&self) -> Vec<CertificateSummary> {
        self.inner.certificates.iter().map(CertificateSummary::of).collect()
    }

    pub(crate) fn candidate_stack(&self) -> Result<Stack<X509>, ErrorStack> {
        let mut stack = Stack::new()?;
        for certificate in &self.inner.certificates {
            stack.push(certificate.clone())?;
        }
        Ok(stack)
    }

    pub(crate) fn verify_store(&self) -> &X509StoreRef {
        &self.inner.verify_store
    }
}

impl fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustStore")
            .field("certificates", &self.summaries())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iddoc_testkit::TestSigner;
    use std::io::Write;

    #[test]
    fn test_add_pem_certificate() {
        let signer = TestSigner::rsa("c1");
        let mut builder = TrustStoreBuilder::new();
        builder.add_pem_certificate(&signer.cert_pem()).unwrap();

        let store = builder.build().unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.candidates()[0].to_der().unwrap(), signer.cert.to_der().unwrap());
    }

    #[test]
    fn test_candidates_keep_insertion_order() {
        let a = TestSigner::rsa("a");
        let b = TestSigner::ec("b");
        let mut builder = TrustStoreBuilder::new();
        builder.add_certificate(a.cert.clone()).add_certificate(b.cert.clone());

        let names: Vec<_> = builder
            .build()
            .unwrap()
            .summaries()
            .into_iter()
            .map(|s| s.common_name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_summary_keeps_interior_nul() {
        let signer = TestSigner::rsa("audit\0tail");
        let summary = CertificateSummary::of(&signer.cert);
        assert_eq!(summary.common_name, "audit\0tail");
        assert_eq!(summary.organization, "Test Signing Authority");
    }

    #[test]
    fn test_missing_pem_block() {
        let mut builder = TrustStoreBuilder::new();
        let err = builder.add_pem_certificate(b"garbage").err().unwrap();
        assert!(matches!(err, TrustError::MalformedCertificate(_)));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_pem_block_with_invalid_certificate() {
        let data = b"-----BEGIN CERTIFICATE-----\naGVsbG8gd29ybGQ=\n-----END CERTIFICATE-----\n";
        let mut builder = TrustStoreBuilder::new();
        let err = builder.add_pem_certificate(data).err().unwrap();
        assert!(matches!(err, TrustError::MalformedCertificate(_)));
    }

    #[test]
    fn test_empty_store_rejected() {
        assert!(matches!(TrustStoreBuilder::new().build(), Err(TrustError::Empty)));
    }

    #[test]
    fn test_amazon_certificate_identity() {
        let mut builder = TrustStoreBuilder::new();
        builder.add_amazon_public_cloud().unwrap();
        let store = builder.build().unwrap();

        let summary = &store.summaries()[0];
        assert_eq!(summary.organization, "Amazon Web Services LLC");
        assert_eq!(summary.province, "Washington State");
        assert_eq!(summary.country, "US");
    }

    #[test]
    fn test_read_pem_certificate_from_file() {
        let signer = TestSigner::rsa("on-disk");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&signer.cert_pem()).unwrap();

        let mut builder = TrustStoreBuilder::new();
        builder.read_pem_certificate(file.path()).unwrap();
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_read_missing_file() {
        let mut builder = TrustStoreBuilder::new();
        let err = builder
            .read_pem_certificate("/nonexistent/iddoc/cert.pem")
            .err()
            .unwrap();
        match err {
            TrustError::Io { path, .. } => assert!(path.ends_with("cert.pem")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_store_clones_share_certificates() {
        let mut builder = TrustStoreBuilder::new();
        builder.add_certificate(TestSigner::rsa("shared").cert);
        let store = builder.build().unwrap();
        let clone = store.clone();
        assert!(std::ptr::eq(store.candidates(), clone.candidates()));
    }
}
