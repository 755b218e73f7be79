//! Load balancer node rotation client.
//!
//! Takes servers out of rotation (disable, then wait for connections to
//! drain) and back in (enable, then wait for the enabled status) through a
//! session-authenticated REST API.

// Command protocol and its plumbing
pub mod api;
pub mod error;
pub mod transport;

// Sessions and convergence
pub mod convergence;
pub mod session;

// Facade
pub mod client;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use api::{CommandFactory, Credentials, Endpoint, NodeStatus, SessionToken};
pub use client::RotationClient;
pub use config::RotationConfig;
pub use convergence::{RetryPolicy, TransientCodes};
pub use error::{RemoteError, RotationError, RotationResult};
pub use observability::{Diagnostic, DiagnosticSink, RecordingSink, TracingSink};
pub use session::SessionManager;
pub use transport::{
    ApiRequest, HttpMethod, HttpTransport, TlsVersion, Transport, TransportConfig, TransportError,
};
