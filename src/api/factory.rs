//! Factory for commands bound to a shared transport.

use std::fmt;
use std::sync::Arc;

use crate::api::commands::{
    NodeActiveConnectionsCommand, NodeChange, NodeStatusCommand, NodeUpdateCommand,
    SessionEndCommand, SessionStartCommand,
};
use crate::api::types::{Credentials, Endpoint, SessionToken};
use crate::transport::Transport;

/// Hands out commands that all send through the same transport.
///
/// Cheap to clone and safe to share between tasks.
#[derive(Clone)]
pub struct CommandFactory {
    transport: Arc<dyn Transport>,
}

impl CommandFactory {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn session_start(&self, endpoint: &Endpoint, credentials: &Credentials) -> SessionStartCommand {
        SessionStartCommand::new(self.transport.clone(), endpoint.clone(), credentials.clone())
    }

    pub fn session_end(&self, endpoint: &Endpoint, session: &SessionToken) -> SessionEndCommand {
        SessionEndCommand::new(self.transport.clone(), endpoint.clone(), session.clone())
    }

    pub fn node_status(&self, endpoint: &Endpoint, session: &SessionToken, node: &str) -> NodeStatusCommand {
        NodeStatusCommand::new(self.transport.clone(), endpoint.clone(), session.clone(), node)
    }

    pub fn active_connections(
        &self,
        endpoint: &Endpoint,
        session: &SessionToken,
        node: &str,
    ) -> NodeActiveConnectionsCommand {
        NodeActiveConnectionsCommand::new(self.transport.clone(), endpoint.clone(), session.clone(), node)
    }

    pub fn enable_node(&self, endpoint: &Endpoint, session: &SessionToken, node: &str) -> NodeUpdateCommand {
        NodeUpdateCommand::new(self.transport.clone(), endpoint.clone(), session.clone(), node, NodeChange::Enable)
    }

    pub fn disable_node(&self, endpoint: &Endpoint, session: &SessionToken, node: &str) -> NodeUpdateCommand {
        NodeUpdateCommand::new(self.transport.clone(), endpoint.clone(), session.clone(), node, NodeChange::Disable)
    }
}

impl fmt::Debug for CommandFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandFactory").finish_non_exhaustive()
    }
}
