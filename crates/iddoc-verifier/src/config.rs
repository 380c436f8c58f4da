//! Verifier configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use iddoc_core::{TrustError, TrustStore, TrustStoreBuilder};
use thiserror::Error;
use tracing::Level;

use crate::api::response::DocumentEncoding;

pub const ENV_PORT: &str = "IDDOC_PORT";
pub const ENV_LOG_LEVEL: &str = "IDDOC_LOG_LEVEL";
pub const ENV_CERT_PATHS: &str = "IDDOC_CERT_PATHS";
pub const ENV_TRUST_AMAZON: &str = "IDDOC_TRUST_AMAZON";
pub const ENV_DOCUMENT_ENCODING: &str = "IDDOC_DOCUMENT_ENCODING";
pub const ENV_MAX_BODY_BYTES: &str = "IDDOC_MAX_BODY_BYTES";

/// Errors during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Verifier runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port to listen on.
    pub port: u16,
    /// Maximum log level.
    pub log_level: Level,
    /// PEM certificate files to trust.
    pub cert_paths: Vec<PathBuf>,
    /// Trust the embedded AWS public cloud certificate.
    pub trust_amazon: bool,
    /// Representation of the verified document in responses.
    pub document_encoding: DocumentEncoding,
    /// Largest request body read before failing the request.
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            log_level: Level::INFO,
            cert_paths: Vec::new(),
            trust_amazon: true,
            document_encoding: DocumentEncoding::Base64,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if any variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if any variable fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup(ENV_PORT) {
            Some(v) => v.trim().parse().map_err(|_| invalid(ENV_PORT, "must be a valid port number"))?,
            None => defaults.port,
        };

        let log_level = match lookup(ENV_LOG_LEVEL) {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_LOG_LEVEL, "must be one of trace, debug, info, warn, error"))?,
            None => defaults.log_level,
        };

        let cert_paths = lookup(ENV_CERT_PATHS)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        let trust_amazon = match lookup(ENV_TRUST_AMAZON) {
            Some(v) => parse_bool(&v).ok_or_else(|| invalid(ENV_TRUST_AMAZON, "must be true or false"))?,
            None => defaults.trust_amazon,
        };

        let document_encoding = match lookup(ENV_DOCUMENT_ENCODING) {
            Some(v) => v.trim().parse().map_err(|e: String| invalid(ENV_DOCUMENT_ENCODING, &e))?,
            None => defaults.document_encoding,
        };

        let max_body_bytes = match lookup(ENV_MAX_BODY_BYTES) {
            Some(v) => match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(invalid(ENV_MAX_BODY_BYTES, "must be a positive integer")),
            },
            None => defaults.max_body_bytes,
        };

        Ok(Self {
            port,
            log_level,
            cert_paths,
            trust_amazon,
            document_encoding,
            max_body_bytes,
        })
    }

    /// Address the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Load every configured certificate into a frozen trust store.
    ///
    /// # Errors
    ///
    /// Any certificate that cannot be read or decoded is fatal, as is an
    /// empty result.
    pub fn build_trust_store(&self) -> Result<TrustStore, TrustError> {
        let mut builder = TrustStoreBuilder::new();
        if self.trust_amazon {
            builder.add_amazon_public_cloud()?;
        }
        for path in &self.cert_paths {
            builder.read_pem_certificate(path)?;
        }
        builder.build()
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
