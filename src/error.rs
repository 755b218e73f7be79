//! Error taxonomy for load balancer operations.
//!
//! # Classification
//! - API failures carry the device's `(message, code)` pair and are retried
//!   only when the code is in the configured transient set
//! - `MalformedResponse` means the reply did not match the success/fail
//!   envelope at all; it is never retried
//! - Transport failures have no remote code and are never retried

use std::fmt;

use thiserror::Error;

use crate::convergence::policy::TransientCodes;
use crate::transport::TransportError;

/// Error message and code reported by the load balancer in a failed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub message: String,
    pub code: i64,
}

impl RemoteError {
    /// "Object specified does not exist", returned for unknown nodes.
    pub const UNKNOWN_OBJECT: i64 = 1_023_460_352;

    pub fn new(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    /// True if the device reported that the named object does not exist.
    pub fn is_unknown_object(&self) -> bool {
        self.code == Self::UNKNOWN_OBJECT
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API-message: {}. API-code: {}", self.message, self.code)
    }
}

/// Errors that can occur while talking to the load balancer.
#[derive(Debug, Error)]
pub enum RotationError {
    /// Session could not be started.
    #[error("{context}. {remote}")]
    AuthenticationFailure { context: String, remote: RemoteError },

    /// Session could not be closed.
    #[error("{context}. {remote}")]
    SessionCloseFailure { context: String, remote: RemoteError },

    /// Status or statistics of a node could not be read.
    #[error("{context}. {remote}")]
    NodeStatusFailure { context: String, remote: RemoteError },

    /// Node could not be enabled.
    #[error("{context}. {remote}")]
    NodeEnableFailure { context: String, remote: RemoteError },

    /// Node could not be disabled.
    #[error("{context}. {remote}")]
    NodeDisableFailure { context: String, remote: RemoteError },

    /// Response did not match the expected success/fail envelope.
    #[error("Unexpected response format from {action}: {detail}")]
    MalformedResponse { action: &'static str, detail: String },

    /// Network, TLS or decoding failure below the API layer.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Client could not be built from the supplied settings.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Result type for load balancer operations.
pub type RotationResult<T> = Result<T, RotationError>;

impl RotationError {
    /// The remote `(message, code)` pair, if this is an API failure.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            RotationError::AuthenticationFailure { remote, .. }
            | RotationError::SessionCloseFailure { remote, .. }
            | RotationError::NodeStatusFailure { remote, .. }
            | RotationError::NodeEnableFailure { remote, .. }
            | RotationError::NodeDisableFailure { remote, .. } => Some(remote),
            _ => None,
        }
    }

    /// True if this is an API failure whose code is in `transient`.
    pub fn is_transient(&self, transient: &TransientCodes) -> bool {
        self.remote()
            .map(|remote| transient.contains(remote.code))
            .unwrap_or(false)
    }

    /// True if the device reported the node as unknown.
    pub fn is_unknown_node(&self) -> bool {
        self.remote().map(RemoteError::is_unknown_object).unwrap_or(false)
    }
}
