//! Load balancer command protocol.
//!
//! # Data Flow
//! ```text
//! CommandFactory (shared transport)
//!     → command (one API action, e.g. slb.server.update)
//!     → request.rs (base URL + format/method/session_id params)
//!     → Transport::execute
//!     → response.rs (success/fail envelope)
//!     → typed value or RotationError
//! ```
//!
//! # Wire Protocol
//! - Base path: `<scheme_host>/services/rest/v2/`
//! - GET for authenticate, slb.server.search, slb.server.fetchStatistics
//! - POST for slb.server.update and session.close
//! - Reads fail by omitting their top-level key; writes fail with `response.status == "fail"`

pub mod commands;
pub mod factory;
pub mod request;
pub mod response;
pub mod types;

pub use commands::{
    NodeActiveConnectionsCommand, NodeChange, NodeStatusCommand, NodeUpdateCommand,
    SessionEndCommand, SessionStartCommand,
};
pub use factory::CommandFactory;
pub use types::{Credentials, Endpoint, NodeStatus, SessionToken};
