//! Per-request verification lifecycle
//!
//! ```text
//! Empty -> BodyLoaded -> EnvelopeParsed -> Verified
//!   \__________\______________\_____________> Failed
//! ```
//!
//! Every transition takes the current state out and leaves `Failed` behind
//! unless it succeeds, so a request that failed once can never be verified.
//! Calling an operation from the wrong stage is a contract violation and is
//! reported as [`VerifyError::InvalidState`].

use std::io::Read;

use tracing::{debug, warn};

use crate::envelope::Envelope;
use crate::error::{Result, VerifyError};
use crate::trust::TrustStore;

/// Observable lifecycle stage of a [`VerificationRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Empty,
    BodyLoaded,
    EnvelopeParsed,
    Verified,
    Failed,
}

enum State {
    Empty,
    BodyLoaded {
        raw: Vec<u8>,
    },
    EnvelopeParsed {
        envelope: Envelope,
        candidates: TrustStore,
    },
    Verified {
        envelope: Envelope,
        content: Vec<u8>,
    },
    Failed,
}

impl State {
    fn stage(&self) -> Stage {
        match self {
            State::Empty => Stage::Empty,
            State::BodyLoaded { .. } => Stage::BodyLoaded,
            State::EnvelopeParsed { .. } => Stage::EnvelopeParsed,
            State::Verified { .. } => Stage::Verified,
            State::Failed => Stage::Failed,
        }
    }
}

/// One inbound signed document on its way from raw bytes to verified content
pub struct VerificationRequest {
    state: State,
}

impl VerificationRequest {
    pub fn new() -> Self {
        Self { state: State::Empty }
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    /// Read the raw envelope bytes to completion
    pub fn load<R: Read>(&mut self, mut reader: R) -> Result<()> {
        match self.take() {
            State::Empty => {}
            other => return Err(out_of_order("load", other.stage())),
        }

        let mut raw = Vec::new();
        reader.read_to_end(&mut raw).map_err(|e| {
            warn!(error = %e, "Failed to read signed envelope");
            VerifyError::from(e)
        })?;

        debug!(len = raw.len(), "Loaded signed envelope");
        self.state = State::BodyLoaded { raw };
        Ok(())
    }

    /// Decode the loaded bytes and attach the trust candidates
    ///
    /// Faults inside the decoder surface as `MalformedEnvelope`.
    pub fn decode(&mut self, candidates: &TrustStore) -> Result<()> {
        let raw = match self.take() {
            State::BodyLoaded { raw } => raw,
            other => return Err(out_of_order("decode", other.stage())),
        };

        let envelope = Envelope::decode(&raw)?;
        self.state = State::EnvelopeParsed {
            envelope,
            candidates: candidates.clone(),
        };
        Ok(())
    }

    /// Verify the decoded envelope against the attached candidates
    pub fn verify(&mut self) -> Result<()> {
        let (envelope, candidates) = match self.take() {
            State::EnvelopeParsed {
                envelope,
                candidates,
            } => (envelope, candidates),
            other => return Err(out_of_order("verify", other.stage())),
        };

        let content = envelope.verify(&candidates)?;
        self.state = State::Verified { envelope, content };
        Ok(())
    }

    /// The decoded envelope, once parsed
    pub fn envelope(&self) -> Option<&Envelope> {
        match &self.state {
            State::EnvelopeParsed { envelope, .. } | State::Verified { envelope, .. } => {
                Some(envelope)
            }
            _ => None,
        }
    }

    /// The signed payload; only available after a successful `verify`
    pub fn content(&self) -> Result<&[u8]> {
        match &self.state {
            State::Verified { content, .. } => Ok(content.as_slice()),
            other => Err(VerifyError::InvalidState(format!(
                "content requested at stage {:?}",
                other.stage()
            ))),
        }
    }

    /// Consume the request and return the signed payload
    pub fn into_content(self) -> Result<Vec<u8>> {
        match self.state {
            State::Verified { content, .. } => Ok(content),
            other => Err(VerifyError::InvalidState(format!(
                "content requested at stage {:?}",
                other.stage()
            ))),
        }
    }

    fn take(&mut self) -> State {
        std::mem::replace(&mut self.state, State::Failed)
    }
}

impl Default for VerificationRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VerificationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationRequest")
            .field("stage", &self.stage())
            .finish()
    }
}

fn out_of_order(operation: &str, stage: Stage) -> VerifyError {
    warn!(operation = operation, stage = ?stage, "Verification lifecycle violation");
    VerifyError::InvalidState(format!("{operation} called at stage {stage:?}"))
}
