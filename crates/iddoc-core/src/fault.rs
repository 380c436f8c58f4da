//! Panic boundary for code that processes attacker-controlled bytes
//!
//! Anything that parses untrusted input runs through [`isolate`]. A panic is
//! caught, logged with its full payload, and replaced by a generic
//! [`VerifyError::MalformedEnvelope`] so the handling task keeps running and
//! the caller learns nothing about decoder internals.
//!
//! The process panic hook still runs before the unwind is caught. Binaries
//! call [`install_panic_hook`] so that report goes through `tracing` rather
//! than raw stderr.

use std::any::Any;
use std::panic::{self, catch_unwind, AssertUnwindSafe};

use tracing::error;

use crate::error::{Result, VerifyError};

/// Caller-visible message for any fault caught at the boundary
pub const DECODE_FAULT_MESSAGE: &str = "error parsing PKCS7 PEM block";

/// Run `f`, converting a panic into `MalformedEnvelope`
///
/// Explicit errors returned by `f` pass through unchanged.
pub fn isolate<T, F>(stage: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            error!(
                stage = stage,
                panic = %panic_message(payload.as_ref()),
                "Panic while processing untrusted input"
            );
            Err(VerifyError::MalformedEnvelope(DECODE_FAULT_MESSAGE.into()))
        }
    }
}

/// Replace the default panic hook with one that logs through `tracing`
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        error!(
            panic = %panic_message(info.payload()),
            location = %location,
            "Panic"
        );
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
