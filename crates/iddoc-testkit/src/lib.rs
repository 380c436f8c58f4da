//! Test fixtures for the identity document verifier
//!
//! Generates self-signed signing certificates and PKCS#7 `SignedData`
//! envelopes with OpenSSL so tests never depend on files on disk.

use base64::{engine::general_purpose::STANDARD, Engine};
use openssl::asn1::{Asn1Integer, Asn1Time};
use openssl::bn::BigNum;
use openssl::dsa::Dsa;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::{X509Builder, X509NameBuilder, X509};

/// Attached envelope over `hello` carrying two signer infos, one for each
/// of [`CO_SIGNER_A_CERT`] and [`CO_SIGNER_B_CERT`]
///
/// `Pkcs7::sign` only adds a single signer, so this one is checked in
/// (`openssl smime -sign -signer a -signer b -nodetach -binary`).
pub const TWO_SIGNER_ENVELOPE: &[u8] = include_bytes!("../fixtures/two-signers.p7");

pub const CO_SIGNER_A_CERT: &[u8] = include_bytes!("../fixtures/signer-a.pem");

pub const CO_SIGNER_B_CERT: &[u8] = include_bytes!("../fixtures/signer-b.pem");

/// Certificates-only signed data: no signer info and no content
/// (`openssl crl2pkcs7 -nocrl -certfile signer-a.pem`)
pub const NO_SIGNER_ENVELOPE: &[u8] = include_bytes!("../fixtures/no-signers.p7");

/// Key algorithm for a generated signer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Rsa,
    EcP256,
    Dsa,
}

/// A self-signed certificate plus its private key
pub struct TestSigner {
    pub cert: X509,
    key: PKey<Private>,
}

impl TestSigner {
    /// RSA-2048 signer with a random serial
    pub fn rsa(common_name: &str) -> Self {
        Self::generate(KeyKind::Rsa, common_name, None)
    }

    /// P-256 ECDSA signer with a random serial
    pub fn ec(common_name: &str) -> Self {
        Self::generate(KeyKind::EcP256, common_name, None)
    }

    /// DSA-2048 signer with a random serial
    pub fn dsa(common_name: &str) -> Self {
        Self::generate(KeyKind::Dsa, common_name, None)
    }

    /// Signer with a fixed serial, for identity collision scenarios
    pub fn with_serial(kind: KeyKind, common_name: &str, serial: u32) -> Self {
        Self::generate(kind, common_name, Some(serial))
    }

    fn generate(kind: KeyKind, common_name: &str, serial: Option<u32>) -> Self {
        let key = match kind {
            KeyKind::Rsa => PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap(),
            KeyKind::EcP256 => {
                let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
                PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
            }
            KeyKind::Dsa => PKey::from_dsa(Dsa::generate(2048).unwrap()).unwrap(),
        };

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_nid(Nid::COUNTRYNAME, "US").unwrap();
        name.append_entry_by_nid(Nid::STATEORPROVINCENAME, "Washington State").unwrap();
        name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Test Signing Authority").unwrap();
        name.append_entry_by_nid(Nid::COMMONNAME, common_name).unwrap();
        let name = name.build();

        let serial = match serial {
            Some(s) => BigNum::from_u32(s).unwrap(),
            None => {
                let mut bn = BigNum::new().unwrap();
                bn.rand(63, openssl::bn::MsbOption::MAYBE_ZERO, false).unwrap();
                bn
            }
        };
        let serial = Asn1Integer::from_bn(&serial).unwrap();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(365).unwrap())
            .unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();

        Self {
            cert: builder.build(),
            key,
        }
    }

    /// The signing certificate, PEM encoded
    pub fn cert_pem(&self) -> Vec<u8> {
        self.cert.to_pem().unwrap()
    }

    /// Sign `content` into an attached PKCS#7 envelope, DER encoded
    pub fn sign_der(&self, content: &[u8]) -> Vec<u8> {
        self.sign_with(content, Pkcs7Flags::BINARY).to_der().unwrap()
    }

    /// Sign `content` into an attached PKCS#7 envelope, PEM armored
    pub fn sign(&self, content: &[u8]) -> Vec<u8> {
        self.sign_with(content, Pkcs7Flags::BINARY).to_pem().unwrap()
    }

    /// Sign `content` without embedding it in the envelope
    pub fn sign_detached(&self, content: &[u8]) -> Vec<u8> {
        self.sign_with(content, Pkcs7Flags::BINARY | Pkcs7Flags::DETACHED)
            .to_pem()
            .unwrap()
    }

    /// Sign `content`, embedding `extra` next to this signer's own
    /// certificate
    pub fn sign_embedding(&self, content: &[u8], extra: &X509) -> Vec<u8> {
        let mut certs = Stack::new().unwrap();
        certs.push(extra.clone()).unwrap();
        Pkcs7::sign(&self.cert, &self.key, &certs, content, Pkcs7Flags::BINARY)
            .unwrap()
            .to_pem()
            .unwrap()
    }

    fn sign_with(&self, content: &[u8], flags: Pkcs7Flags) -> Pkcs7 {
        let certs = Stack::new().unwrap();
        Pkcs7::sign(&self.cert, &self.key, &certs, content, flags).unwrap()
    }
}

/// Wrap DER bytes in PEM armor with the given label
pub fn armor(label: &str, der: &[u8]) -> Vec<u8> {
    let body = STANDARD.encode(der);
    let mut out = format!("-----BEGIN {label}-----\n");
    for line in body.as_bytes().chunks(64) {
        out.push_str(std::str::from_utf8(line).unwrap());
        out.push('\n');
    }
    out.push_str(&format!("-----END {label}-----\n"));
    out.into_bytes()
}

/// Re-armor `der` with one bit of its final byte flipped
///
/// The final bytes of an attached PKCS#7 envelope without unauthenticated
/// attributes are the signature value of the last signer info.
pub fn flip_signature_bit(der: &[u8], bit: u8) -> Vec<u8> {
    let mut tampered = der.to_vec();
    if let Some(last) = tampered.last_mut() {
        *last ^= 1 << (bit % 8);
    }
    armor("PKCS7", &tampered)
}

/// Armor only the first `len` bytes of `der`
pub fn truncated(der: &[u8], len: usize) -> Vec<u8> {
    armor("PKCS7", &der[..len.min(der.len())])
}
