//! One command per load balancer action.
//!
//! Each command formats a single request, sends it through the transport,
//! and turns the reply into a typed value or a classified error. Commands
//! can be sent more than once; every `send` is exactly one round trip.

use std::sync::Arc;

use serde_json::Value;

use crate::api::request::{
    self, ACTION_AUTHENTICATE, ACTION_CLOSE_SESSION, ACTION_SEARCH_SERVER,
    ACTION_SERVER_STATISTICS, ACTION_UPDATE_SERVER,
};
use crate::api::response::{extract_error, malformed, mutation_failure, truthy};
use crate::api::types::{Credentials, Endpoint, NodeStatus, SessionToken};
use crate::error::{RotationError, RotationResult};
use crate::transport::{ApiRequest, HttpMethod, Transport};

async fn execute(transport: &dyn Transport, request: &ApiRequest) -> RotationResult<Value> {
    Ok(transport.execute(request).await?)
}

/// Starts an authenticated session.
pub struct SessionStartCommand {
    transport: Arc<dyn Transport>,
    endpoint: Endpoint,
    credentials: Credentials,
}

impl SessionStartCommand {
    pub fn new(transport: Arc<dyn Transport>, endpoint: Endpoint, credentials: Credentials) -> Self {
        Self {
            transport,
            endpoint,
            credentials,
        }
    }

    pub fn request(&self) -> RotationResult<ApiRequest> {
        request::build(
            HttpMethod::Get,
            &self.endpoint,
            ACTION_AUTHENTICATE,
            None,
            &[
                ("username", self.credentials.username.clone()),
                ("password", self.credentials.password.clone()),
            ],
        )
    }

    pub async fn send(&self) -> RotationResult<SessionToken> {
        tracing::debug!(endpoint = %self.endpoint, "Making session start request");
        let body = execute(self.transport.as_ref(), &self.request()?).await?;

        match body.get("session_id") {
            Some(Value::String(token)) => Ok(SessionToken::new(token.clone())),
            Some(_) => Err(malformed(ACTION_AUTHENTICATE, &body)),
            None => {
                let remote = extract_error(ACTION_AUTHENTICATE, &body)?;
                Err(RotationError::AuthenticationFailure {
                    context: format!("Authentication failure with {}", self.endpoint),
                    remote,
                })
            }
        }
    }
}

/// Closes a previously started session.
pub struct SessionEndCommand {
    transport: Arc<dyn Transport>,
    endpoint: Endpoint,
    session: SessionToken,
}

impl SessionEndCommand {
    pub fn new(transport: Arc<dyn Transport>, endpoint: Endpoint, session: SessionToken) -> Self {
        Self {
            transport,
            endpoint,
            session,
        }
    }

    pub fn request(&self) -> RotationResult<ApiRequest> {
        request::build(
            HttpMethod::Post,
            &self.endpoint,
            ACTION_CLOSE_SESSION,
            Some(&self.session),
            &[],
        )
    }

    pub async fn send(&self) -> RotationResult<bool> {
        tracing::debug!(endpoint = %self.endpoint, "Making session close request");
        let body = execute(self.transport.as_ref(), &self.request()?).await?;

        match mutation_failure(ACTION_CLOSE_SESSION, &body)? {
            Some(remote) => Err(RotationError::SessionCloseFailure {
                context: format!("Could not close session {} on {}", self.session, self.endpoint),
                remote,
            }),
            None => Ok(true),
        }
    }
}

/// Which way a node update goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeChange {
    Enable,
    Disable,
}

impl NodeChange {
    /// Value of the `status` parameter.
    pub fn status_value(&self) -> u8 {
        match self {
            NodeChange::Enable => 1,
            NodeChange::Disable => 0,
        }
    }
}

/// Enables or disables a node at the node level.
pub struct NodeUpdateCommand {
    transport: Arc<dyn Transport>,
    endpoint: Endpoint,
    session: SessionToken,
    node: String,
    change: NodeChange,
}

impl NodeUpdateCommand {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: Endpoint,
        session: SessionToken,
        node: impl Into<String>,
        change: NodeChange,
    ) -> Self {
        Self {
            transport,
            endpoint,
            session,
            node: node.into(),
            change,
        }
    }

    pub fn request(&self) -> RotationResult<ApiRequest> {
        request::build(
            HttpMethod::Post,
            &self.endpoint,
            ACTION_UPDATE_SERVER,
            Some(&self.session),
            &[
                ("name", self.node.clone()),
                ("server", self.node.clone()),
                ("status", self.change.status_value().to_string()),
            ],
        )
    }

    pub async fn send(&self) -> RotationResult<bool> {
        tracing::debug!(node = %self.node, change = ?self.change, "Making node update request");
        let body = execute(self.transport.as_ref(), &self.request()?).await?;

        let Some(remote) = mutation_failure(ACTION_UPDATE_SERVER, &body)? else {
            return Ok(true);
        };

        Err(match self.change {
            NodeChange::Enable => RotationError::NodeEnableFailure {
                context: format!("Could not enable node {}", self.node),
                remote,
            },
            NodeChange::Disable => RotationError::NodeDisableFailure {
                context: format!("Could not disable node {}", self.node),
                remote,
            },
        })
    }
}

/// Reads whether a node is enabled or disabled.
pub struct NodeStatusCommand {
    transport: Arc<dyn Transport>,
    endpoint: Endpoint,
    session: SessionToken,
    node: String,
}

impl NodeStatusCommand {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: Endpoint,
        session: SessionToken,
        node: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            endpoint,
            session,
            node: node.into(),
        }
    }

    pub fn request(&self) -> RotationResult<ApiRequest> {
        request::build(
            HttpMethod::Get,
            &self.endpoint,
            ACTION_SEARCH_SERVER,
            Some(&self.session),
            &[("name", self.node.clone())],
        )
    }

    /// Only `Enabled` or `Disabled`; this action carries a boolean status.
    pub async fn send(&self) -> RotationResult<NodeStatus> {
        tracing::debug!(node = %self.node, "Making node status request");
        let body = execute(self.transport.as_ref(), &self.request()?).await?;

        let Some(server) = body.get("server") else {
            let remote = extract_error(ACTION_SEARCH_SERVER, &body)?;
            return Err(RotationError::NodeStatusFailure {
                context: format!("Could not get status of {}", self.node),
                remote,
            });
        };

        let status = server
            .get("status")
            .ok_or_else(|| malformed(ACTION_SEARCH_SERVER, &body))?;

        Ok(if truthy(status) {
            NodeStatus::Enabled
        } else {
            NodeStatus::Disabled
        })
    }
}

/// Reads the active connection count of a node across all its groups.
pub struct NodeActiveConnectionsCommand {
    transport: Arc<dyn Transport>,
    endpoint: Endpoint,
    session: SessionToken,
    node: String,
}

impl NodeActiveConnectionsCommand {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: Endpoint,
        session: SessionToken,
        node: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            endpoint,
            session,
            node: node.into(),
        }
    }

    pub fn request(&self) -> RotationResult<ApiRequest> {
        request::build(
            HttpMethod::Get,
            &self.endpoint,
            ACTION_SERVER_STATISTICS,
            Some(&self.session),
            &[("name", self.node.clone())],
        )
    }

    pub async fn send(&self) -> RotationResult<u64> {
        tracing::debug!(node = %self.node, "Making active connection count request");
        let body = execute(self.transport.as_ref(), &self.request()?).await?;

        let Some(stats) = body.get("server_stat") else {
            let remote = extract_error(ACTION_SERVER_STATISTICS, &body)?;
            return Err(RotationError::NodeStatusFailure {
                context: format!("Could not get active connection count of {}", self.node),
                remote,
            });
        };

        stats
            .get("cur_conns")
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed(ACTION_SERVER_STATISTICS, &body))
    }
}
