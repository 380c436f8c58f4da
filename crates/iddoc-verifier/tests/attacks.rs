//! Attack Scenario Tests
//!
//! These tests verify that forged or tampered documents are rejected over
//! HTTP. Each test represents a way an attacker might try to get a document
//! accepted without holding a trusted signing key.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use iddoc_core::TrustStoreBuilder;
use iddoc_testkit::{
    armor, flip_signature_bit, KeyKind, TestSigner, CO_SIGNER_A_CERT, CO_SIGNER_B_CERT,
    NO_SIGNER_ENVELOPE, TWO_SIGNER_ENVELOPE,
};
use iddoc_verifier::{create_router, AppState, Config, VerificationService};
use serde_json::Value;
use tower::ServiceExt;

// =============================================================================
// Test Helpers
// =============================================================================

fn create_app(trusted: &TestSigner) -> Router {
    let mut builder = TrustStoreBuilder::new();
    builder.add_certificate(trusted.cert.clone());
    app_with(builder)
}

fn create_app_from_pem(trusted: &[&[u8]]) -> Router {
    let mut builder = TrustStoreBuilder::new();
    for pem in trusted {
        builder.add_pem_certificate(pem).unwrap();
    }
    app_with(builder)
}

fn app_with(builder: TrustStoreBuilder) -> Router {
    let config = Config {
        trust_amazon: false,
        ..Config::default()
    };
    let service = VerificationService::from_config(&config, builder.build().unwrap());
    create_router(Arc::new(AppState::new(service, config)))
}

async fn verify(app: &Router, body: Vec<u8>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/verify")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// ATTACK: Tampered Signature
// =============================================================================

/// Attacker edits a genuine envelope in transit.
///
/// Any change to the signature value must fail verification even though the
/// signer certificate still resolves to a trusted one.
#[tokio::test]
async fn attack_tampered_signature_rejected() {
    let trusted = TestSigner::rsa("trusted");
    let app = create_app(&trusted);

    let der = trusted.sign_der(br#"{"instanceId":"i-0abc"}"#);
    let (status, body) = verify(&app, flip_signature_bit(&der, 3)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0], "Signature verification failed");
}

// =============================================================================
// ATTACK: Identity Collision
// =============================================================================

/// Attacker mints a certificate with the trusted issuer name and serial.
///
/// The signer info identifies its certificate by issuer and serial only, so
/// the forged certificate claims the trusted identity. Its key differs, and
/// the document must be rejected as untrusted.
#[tokio::test]
async fn attack_identity_collision_rejected() {
    let trusted = TestSigner::with_serial(KeyKind::Rsa, "collision", 42);
    let forged = TestSigner::with_serial(KeyKind::Rsa, "collision", 42);
    let app = create_app(&trusted);

    let (status, body) = verify(&app, forged.sign(b"hello")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errors"][0], "Signer is not a trusted certificate");
    assert!(body.get("document").is_none());
}

// =============================================================================
// ATTACK: Embedded Trusted Certificate
// =============================================================================

/// Attacker embeds a copy of the trusted certificate in their own envelope.
///
/// Embedded certificates are never consulted for trust; only the signer's
/// issuer and serial resolved against the store matter.
#[tokio::test]
async fn attack_embedded_trusted_cert_ignored() {
    let trusted = TestSigner::rsa("trusted");
    let attacker = TestSigner::rsa("attacker");
    let app = create_app(&trusted);

    let (status, body) = verify(&app, attacker.sign_embedding(b"hello", &trusted.cert)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

// =============================================================================
// ATTACK: Content Stripping
// =============================================================================

/// Attacker submits a detached signature with no content.
///
/// There is no document to return, so the envelope is malformed.
#[tokio::test]
async fn attack_detached_signature_rejected() {
    let trusted = TestSigner::rsa("trusted");
    let app = create_app(&trusted);

    let (status, body) = verify(&app, trusted.sign_detached(b"hello")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// =============================================================================
// ATTACK: Wrong Armor
// =============================================================================

/// Attacker wraps a bare certificate in PKCS7 armor.
#[tokio::test]
async fn attack_certificate_as_envelope_rejected() {
    let trusted = TestSigner::dsa("trusted");
    let app = create_app(&trusted);

    let cert_der = trusted.cert.to_der().unwrap();
    let (status, body) = verify(&app, armor("PKCS7", &cert_der)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// =============================================================================
// ATTACK: Signer Smuggling
// =============================================================================

/// Attacker adds a second signer info next to a trusted one.
///
/// Only single-signer envelopes are accepted, so a trusted co-signature
/// cannot vouch for a second signer, even when both are trusted.
#[tokio::test]
async fn attack_second_signer_rejected() {
    let app = create_app_from_pem(&[CO_SIGNER_A_CERT, CO_SIGNER_B_CERT]);

    let (status, body) = verify(&app, TWO_SIGNER_ENVELOPE.to_vec()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body.get("document").is_none());
}

/// The same envelope against a store trusting only one co-signer.
#[tokio::test]
async fn attack_second_signer_untrusted() {
    let app = create_app_from_pem(&[CO_SIGNER_A_CERT]);

    let (status, body) = verify(&app, TWO_SIGNER_ENVELOPE.to_vec()).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errors"][0], "Signer is not a trusted certificate");
}

/// Certificates-only envelope with no signer info at all.
#[tokio::test]
async fn attack_unsigned_envelope_rejected() {
    let app = create_app_from_pem(&[CO_SIGNER_A_CERT]);

    let (status, body) = verify(&app, NO_SIGNER_ENVELOPE.to_vec()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
