//! Diagnostic events emitted by sessions, convergence loops and scopes.
//!
//! Components receive a `DiagnosticSink` instead of reaching for a global
//! logger. `TracingSink` forwards to `tracing` and `metrics`;
//! `RecordingSink` keeps events for inspection.

use std::sync::Mutex;
use std::time::Duration;

use crate::api::types::NodeStatus;
use crate::observability::metrics;

/// A notable step in talking to the load balancer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    SessionOpened {
        endpoint: String,
    },
    SessionClosed {
        endpoint: String,
    },
    /// Close failed while another failure was already propagating.
    SessionCloseFailed {
        endpoint: String,
        error: String,
    },
    TransientRetry {
        action: &'static str,
        code: i64,
        message: String,
        attempt: u32,
        wait: Duration,
    },
    ConnectionsDraining {
        node: String,
        remaining: u64,
        wait: Duration,
    },
    AwaitingEnabled {
        node: String,
        status: NodeStatus,
        wait: Duration,
    },
    Converged {
        node: String,
        target: NodeStatus,
    },
    NotConverged {
        node: String,
        target: NodeStatus,
    },
    ScopeEntered {
        node: String,
        status: NodeStatus,
        disabled: bool,
    },
    ScopeExited {
        node: String,
        status: NodeStatus,
        enabled: bool,
    },
}

impl Diagnostic {
    /// True for events that represent a sleep between attempts.
    pub fn is_wait(&self) -> bool {
        matches!(
            self,
            Diagnostic::TransientRetry { .. }
                | Diagnostic::ConnectionsDraining { .. }
                | Diagnostic::AwaitingEnabled { .. }
        )
    }
}

/// Receiver of diagnostic events.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: Diagnostic);
}

/// Forwards events to `tracing` and bumps counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, event: Diagnostic) {
        match event {
            Diagnostic::SessionOpened { endpoint } => {
                tracing::debug!(endpoint = %endpoint, "Session opened");
            }
            Diagnostic::SessionClosed { endpoint } => {
                tracing::debug!(endpoint = %endpoint, "Session closed");
            }
            Diagnostic::SessionCloseFailed { endpoint, error } => {
                tracing::warn!(endpoint = %endpoint, error = %error, "Failed to close session after earlier failure");
            }
            Diagnostic::TransientRetry { action, code, message, attempt, wait } => {
                metrics::record_transient_retry(action);
                tracing::debug!(
                    action,
                    code,
                    message = %message,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    "Encountered transient error, retrying"
                );
            }
            Diagnostic::ConnectionsDraining { node, remaining, wait } => {
                metrics::record_poll_wait("connections");
                tracing::debug!(
                    node = %node,
                    remaining,
                    wait_ms = wait.as_millis() as u64,
                    "Connections still active, waiting"
                );
            }
            Diagnostic::AwaitingEnabled { node, status, wait } => {
                metrics::record_poll_wait("enabled");
                tracing::debug!(
                    node = %node,
                    status = %status,
                    wait_ms = wait.as_millis() as u64,
                    "Server is not yet enabled, waiting"
                );
            }
            Diagnostic::Converged { node, target } => {
                tracing::info!(node = %node, target = %target, "Node reached target state");
            }
            Diagnostic::NotConverged { node, target } => {
                metrics::record_unconverged(target.as_str());
                tracing::warn!(node = %node, target = %target, "Node did not reach target state within retry budget");
            }
            Diagnostic::ScopeEntered { node, status, disabled } => {
                if disabled {
                    tracing::info!(node = %node, "Disabled node for scope");
                } else {
                    tracing::debug!(node = %node, status = %status, "Server was not in load balancer, not disabling");
                }
            }
            Diagnostic::ScopeExited { node, status, enabled } => {
                if enabled {
                    tracing::info!(node = %node, "Re-enabled node after scope");
                } else {
                    tracing::debug!(node = %node, status = %status, "Server was not in load balancer, not enabling");
                }
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of sleeps between attempts observed so far.
    pub fn waits(&self) -> usize {
        self.events().iter().filter(|e| e.is_wait()).count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, event: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
