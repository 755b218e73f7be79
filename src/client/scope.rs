//! Temporarily take a node out of rotation around a block of work.

use std::future::Future;

use crate::api::NodeStatus;
use crate::client::RotationClient;
use crate::error::RotationError;
use crate::observability::Diagnostic;

/// Only nodes currently serving traffic are taken out and put back.
fn takes_out_of_rotation(status: NodeStatus) -> bool {
    status == NodeStatus::Enabled
}

impl RotationClient {
    /// Run `body` with `node` out of rotation.
    ///
    /// A node that was enabled is disabled first and re-enabled after `body`
    /// succeeds. A node that was already disabled or down is left alone on
    /// both sides. If `body` fails the node stays disabled.
    pub async fn with_node_disabled<T, E, F, Fut>(&self, node: &str, body: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<RotationError>,
    {
        let status = self.get_status(node).await?;
        let managed = takes_out_of_rotation(status);

        if managed {
            self.disable_server(node, self.max_retries).await?;
        }
        self.diagnostics.emit(Diagnostic::ScopeEntered {
            node: node.to_string(),
            status,
            disabled: managed,
        });

        let value = body().await?;

        if managed {
            self.enable_server(node, self.max_retries).await?;
        }
        self.diagnostics.emit(Diagnostic::ScopeExited {
            node: node.to_string(),
            status,
            enabled: managed,
        });

        Ok(value)
    }
}
