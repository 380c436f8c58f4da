//! Identity Document Verifier Binary
//!
//! Runs the HTTP server that verifies PKCS#7 signed identity documents.

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use iddoc_verifier::{create_router, AppState, Config, VerificationService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    iddoc_core::fault::install_panic_hook();

    // Load trusted certificates; any failure here is fatal
    let trust = config.build_trust_store().map_err(|e| {
        error!(error = %e, "Failed to load trust store");
        e
    })?;

    info!(
        trusted_certificates = trust.len(),
        encoding = ?config.document_encoding,
        max_body_bytes = config.max_body_bytes,
        port = config.port,
        "Starting verifier"
    );

    let service = VerificationService::from_config(&config, trust);
    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(service, config));

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Verifier listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Verifier stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
