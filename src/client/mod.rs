//! Client facade for taking nodes in and out of rotation.
//!
//! # Data Flow
//! ```text
//! disable_server(node, max_retries)
//!     → session scope
//!     → retry_transient(slb.server.update status=0)
//!     → wait_for_zero_connections (bounded)
//!     → final status read → disabled?
//!
//! enable_server(node, max_retries)
//!     → session scope
//!     → retry_transient(slb.server.update status=1)
//!     → wait_for_enabled (bounded)
//!     → final status read → enabled?
//! ```
//!
//! # Design Decisions
//! - Every operation opens and closes its own session, so one client can be
//!   shared across tasks without coordination
//! - Only the mutating phase fails; polling just bounds the wait and the
//!   returned bool reports whether the node converged

pub mod scope;

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::api::request::ACTION_UPDATE_SERVER;
use crate::api::{CommandFactory, Credentials, Endpoint, NodeChange, NodeStatus, SessionToken};
use crate::config::RotationConfig;
use crate::convergence::{
    retry_transient, wait_for_enabled, wait_for_zero_connections, RetryPolicy, TransientCodes,
    DEFAULT_MAX_RETRIES, DEFAULT_WAIT_INTERVAL,
};
use crate::error::{RotationError, RotationResult};
use crate::observability::{Diagnostic, DiagnosticSink, TracingSink};
use crate::session::SessionManager;
use crate::transport::{HttpTransport, Transport, TransportConfig};

/// Load balancer client exposing the node rotation operations.
#[derive(Clone)]
pub struct RotationClient {
    endpoint: Endpoint,
    credentials: Credentials,
    commands: CommandFactory,
    diagnostics: Arc<dyn DiagnosticSink>,
    transient: TransientCodes,
    wait_interval: Duration,
    max_retries: u32,
}

impl RotationClient {
    /// Create a client sending through `transport` with default timing.
    pub fn new(endpoint: Endpoint, credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint,
            credentials,
            commands: CommandFactory::new(transport),
            diagnostics: Arc::new(TracingSink),
            transient: TransientCodes::default(),
            wait_interval: DEFAULT_WAIT_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Build a client with an HTTP transport from validated configuration.
    pub fn from_config(config: &RotationConfig) -> RotationResult<Self> {
        let lb = &config.load_balancer;
        let transport = HttpTransport::new(&TransportConfig {
            verify_tls: lb.verify,
            request_timeout: config.timeouts.request_timeout(),
            tls_version: lb.tls_version().map_err(RotationError::Config)?,
        })?;

        let client = Self::new(
            Endpoint::parse(&lb.scheme_host)?,
            Credentials::new(lb.username.clone(), lb.password.clone()),
            Arc::new(transport),
        )
        .with_wait_interval(config.retries.wait_interval())
        .with_max_retries(config.retries.max_retries)
        .with_transient_codes(config.retries.transient_codes());

        Ok(client)
    }

    pub fn with_wait_interval(mut self, wait_interval: Duration) -> Self {
        self.wait_interval = wait_interval;
        self
    }

    /// Budget used by `with_node_disabled`.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_transient_codes(mut self, transient: TransientCodes) -> Self {
        self.transient = transient;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Replace the command factory, e.g. to route commands through another transport.
    pub fn with_commands(mut self, commands: CommandFactory) -> Self {
        self.commands = commands;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Current status of `node`.
    pub async fn get_status(&self, node: &str) -> RotationResult<NodeStatus> {
        self.sessions()
            .scoped(|session| async move { self.read_status(&session, node).await })
            .instrument(operation_span("get_status", node))
            .await
    }

    /// Active connections to `node` across all of its groups.
    pub async fn get_connections(&self, node: &str) -> RotationResult<u64> {
        self.sessions()
            .scoped(|session| async move { self.read_connections(&session, node).await })
            .instrument(operation_span("get_connections", node))
            .await
    }

    /// Take `node` out of rotation and wait for its connections to drain.
    ///
    /// Returns true if the node reports disabled afterwards. With
    /// `max_retries == 0` the disable is sent once and the status is read
    /// immediately, without polling connections.
    pub async fn disable_server(&self, node: &str, max_retries: u32) -> RotationResult<bool> {
        let policy = self.policy(max_retries);
        self.sessions()
            .scoped(|session| self.disable_in_session(session, node, policy))
            .instrument(operation_span("disable_server", node))
            .await
    }

    /// Put `node` back into rotation and wait until it reports enabled.
    pub async fn enable_server(&self, node: &str, max_retries: u32) -> RotationResult<bool> {
        let policy = self.policy(max_retries);
        self.sessions()
            .scoped(|session| self.enable_in_session(session, node, policy))
            .instrument(operation_span("enable_server", node))
            .await
    }

    async fn disable_in_session(
        &self,
        session: SessionToken,
        node: &str,
        policy: RetryPolicy,
    ) -> RotationResult<bool> {
        self.change_node(&session, node, NodeChange::Disable, &policy).await?;

        let drained = wait_for_zero_connections(node, &policy, self.diagnostics.as_ref(), || {
            let command = self.commands.active_connections(&self.endpoint, &session, node);
            async move { command.send().await }
        })
        .await?;
        tracing::debug!(
            node,
            drained = drained.is_converged(),
            waits = drained.waits(),
            "Finished waiting for connections"
        );

        let status = self.read_status(&session, node).await?;
        Ok(self.report(node, NodeStatus::Disabled, status))
    }

    async fn enable_in_session(
        &self,
        session: SessionToken,
        node: &str,
        policy: RetryPolicy,
    ) -> RotationResult<bool> {
        self.change_node(&session, node, NodeChange::Enable, &policy).await?;

        let enabled = wait_for_enabled(node, &policy, self.diagnostics.as_ref(), || {
            let command = self.commands.node_status(&self.endpoint, &session, node);
            async move { command.send().await }
        })
        .await?;
        tracing::debug!(
            node,
            enabled = enabled.is_converged(),
            waits = enabled.waits(),
            "Finished waiting for enabled status"
        );

        let status = self.read_status(&session, node).await?;
        Ok(self.report(node, NodeStatus::Enabled, status))
    }

    fn sessions(&self) -> SessionManager {
        SessionManager::new(
            self.endpoint.clone(),
            self.credentials.clone(),
            self.commands.clone(),
            self.diagnostics.clone(),
        )
    }

    fn policy(&self, max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, self.wait_interval)
    }

    async fn change_node(
        &self,
        session: &SessionToken,
        node: &str,
        change: NodeChange,
        policy: &RetryPolicy,
    ) -> RotationResult<bool> {
        let command = match change {
            NodeChange::Enable => self.commands.enable_node(&self.endpoint, session, node),
            NodeChange::Disable => self.commands.disable_node(&self.endpoint, session, node),
        };
        retry_transient(
            ACTION_UPDATE_SERVER,
            policy,
            &self.transient,
            self.diagnostics.as_ref(),
            || command.send(),
        )
        .await
    }

    async fn read_status(&self, session: &SessionToken, node: &str) -> RotationResult<NodeStatus> {
        self.commands.node_status(&self.endpoint, session, node).send().await
    }

    async fn read_connections(&self, session: &SessionToken, node: &str) -> RotationResult<u64> {
        self.commands
            .active_connections(&self.endpoint, session, node)
            .send()
            .await
    }

    fn report(&self, node: &str, target: NodeStatus, status: NodeStatus) -> bool {
        let converged = status == target;
        let node = node.to_string();
        if converged {
            self.diagnostics.emit(Diagnostic::Converged { node, target });
        } else {
            self.diagnostics.emit(Diagnostic::NotConverged { node, target });
        }
        converged
    }
}

fn operation_span(operation: &'static str, node: &str) -> tracing::Span {
    tracing::info_span!("rotation", operation, node, op_id = %Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::policy::DEVICE_BUSY;
    use crate::error::{RemoteError, RotationError};
    use crate::observability::RecordingSink;
    use crate::transport::testing::{conns_reply, fail_reply, ok_reply, status_reply, ScriptedTransport};

    fn client(transport: &Arc<ScriptedTransport>, sink: &Arc<RecordingSink>) -> RotationClient {
        RotationClient::new(
            Endpoint::parse("https://lb.example.com").unwrap(),
            Credentials::new("user", "password"),
            transport.clone(),
        )
        .with_wait_interval(Duration::ZERO)
        .with_diagnostics(sink.clone())
    }

    fn retries(sink: &RecordingSink) -> usize {
        sink.events()
            .iter()
            .filter(|e| matches!(e, Diagnostic::TransientRetry { .. }))
            .count()
    }

    #[tokio::test]
    async fn test_get_status_and_connections() {
        let transport = Arc::new(
            ScriptedTransport::with_session()
                .script("slb.server.search", [status_reply(true)])
                .script("slb.server.fetchStatistics", [conns_reply(7)]),
        );
        let sink = Arc::new(RecordingSink::new());
        let client = client(&transport, &sink);

        assert_eq!(client.get_status("app1").await.unwrap(), NodeStatus::Enabled);
        assert_eq!(client.get_connections("app1").await.unwrap(), 7);
        assert_eq!(transport.count("authenticate"), 2);
        assert_eq!(transport.count("session.close"), 2);
    }

    #[tokio::test]
    async fn test_disable_drains_connections() {
        let transport = Arc::new(
            ScriptedTransport::with_session()
                .script("slb.server.update", [ok_reply()])
                .script("slb.server.fetchStatistics", [conns_reply(3), conns_reply(1), conns_reply(0)])
                .script("slb.server.search", [status_reply(false)]),
        );
        let sink = Arc::new(RecordingSink::new());

        assert!(client(&transport, &sink).disable_server("app1", 5).await.unwrap());
        assert_eq!(sink.waits(), 2);
        assert_eq!(transport.count("slb.server.fetchStatistics"), 3);
        assert!(sink.events().contains(&Diagnostic::Converged {
            node: "app1".into(),
            target: NodeStatus::Disabled
        }));
        assert_eq!(transport.requests()[1].param("status"), Some("0"));
    }

    #[tokio::test]
    async fn test_disable_without_retries_skips_polling() {
        let transport = Arc::new(
            ScriptedTransport::with_session()
                .script("slb.server.update", [ok_reply()])
                .script("slb.server.fetchStatistics", [conns_reply(3)])
                .script("slb.server.search", [status_reply(false)]),
        );
        let sink = Arc::new(RecordingSink::new());

        assert!(client(&transport, &sink).disable_server("app1", 0).await.unwrap());
        assert_eq!(
            transport.actions(),
            vec!["authenticate", "slb.server.update", "slb.server.search", "session.close"]
        );
        assert_eq!(sink.waits(), 0);
    }

    #[tokio::test]
    async fn test_enable_waits_for_enabled() {
        let transport = Arc::new(
            ScriptedTransport::with_session()
                .script("slb.server.update", [ok_reply()])
                .script(
                    "slb.server.search",
                    [status_reply(false), status_reply(false), status_reply(true)],
                ),
        );
        let sink = Arc::new(RecordingSink::new());

        assert!(client(&transport, &sink).enable_server("app1", 5).await.unwrap());
        assert_eq!(sink.waits(), 2);
        assert_eq!(transport.requests()[1].param("status"), Some("1"));
    }

    #[tokio::test]
    async fn test_enable_is_idempotent() {
        let transport = Arc::new(
            ScriptedTransport::with_session()
                .script("slb.server.update", [ok_reply()])
                .script("slb.server.search", [status_reply(true)]),
        );
        let sink = Arc::new(RecordingSink::new());

        assert!(client(&transport, &sink).enable_server("app1", 5).await.unwrap());
        assert_eq!(transport.count("slb.server.update"), 1);
        assert_eq!(sink.waits(), 0);
    }

    #[tokio::test]
    async fn test_enable_reports_non_convergence() {
        let transport = Arc::new(
            ScriptedTransport::with_session()
                .script("slb.server.update", [ok_reply()])
                .script("slb.server.search", [status_reply(false)]),
        );
        let sink = Arc::new(RecordingSink::new());

        assert!(!client(&transport, &sink).enable_server("app1", 2).await.unwrap());
        // two polls plus the final read
        assert_eq!(transport.count("slb.server.search"), 3);
        assert!(sink.events().contains(&Diagnostic::NotConverged {
            node: "app1".into(),
            target: NodeStatus::Enabled
        }));
    }

    #[tokio::test]
    async fn test_transient_errors_within_budget_are_absorbed() {
        let busy = fail_reply("Device busy", DEVICE_BUSY);
        let transport = Arc::new(
            ScriptedTransport::with_session()
                .script("slb.server.update", [busy.clone(), busy, ok_reply()])
                .script("slb.server.fetchStatistics", [conns_reply(0)])
                .script("slb.server.search", [status_reply(false)]),
        );
        let sink = Arc::new(RecordingSink::new());

        assert!(client(&transport, &sink).disable_server("app1", 2).await.unwrap());
        assert_eq!(transport.count("slb.server.update"), 3);
        assert_eq!(retries(&sink), 2);
    }

    #[tokio::test]
    async fn test_transient_errors_beyond_budget_surface() {
        let transport = Arc::new(
            ScriptedTransport::with_session()
                .script("slb.server.update", [fail_reply("Device busy", DEVICE_BUSY)]),
        );
        let sink = Arc::new(RecordingSink::new());

        let err = client(&transport, &sink).enable_server("app1", 1).await.unwrap_err();
        match err {
            RotationError::NodeEnableFailure { remote, .. } => {
                assert_eq!(remote, RemoteError::new("Device busy", DEVICE_BUSY))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(transport.count("slb.server.update"), 2);
        assert_eq!(transport.count("session.close"), 1);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::with_session().script(
            "slb.server.update",
            [fail_reply("The object specified does not exist", RemoteError::UNKNOWN_OBJECT)],
        ));
        let sink = Arc::new(RecordingSink::new());

        let err = client(&transport, &sink).disable_server("app1", 5).await.unwrap_err();
        assert!(err.is_unknown_node());
        assert_eq!(transport.count("slb.server.update"), 1);
        assert_eq!(retries(&sink), 0);
    }

    #[tokio::test]
    async fn test_custom_transient_codes() {
        let transport = Arc::new(
            ScriptedTransport::with_session()
                .script("slb.server.update", [fail_reply("Try later", 42), ok_reply()])
                .script("slb.server.search", [status_reply(true)]),
        );
        let sink = Arc::new(RecordingSink::new());

        let client = client(&transport, &sink).with_transient_codes(TransientCodes::from_codes([42]));
        assert!(client.enable_server("app1", 3).await.unwrap());
        assert_eq!(retries(&sink), 1);
    }

    #[tokio::test]
    async fn test_injected_command_factory_is_used() {
        let unused = Arc::new(ScriptedTransport::new());
        let transport = Arc::new(
            ScriptedTransport::with_session().script("slb.server.fetchStatistics", [conns_reply(4)]),
        );
        let sink = Arc::new(RecordingSink::new());

        let client = client(&unused, &sink).with_commands(CommandFactory::new(transport.clone()));
        assert_eq!(client.get_connections("app1").await.unwrap(), 4);
        assert!(unused.requests().is_empty());
        assert_eq!(transport.count("slb.server.fetchStatistics"), 1);
    }

    #[test]
    fn test_from_config_applies_tls_version() {
        let mut config: RotationConfig = toml::from_str(crate::config::DEFAULT_TEMPLATE).unwrap();
        config.load_balancer.tls_version = Some("TLSv1_2".into());
        assert!(RotationClient::from_config(&config).is_ok());

        config.load_balancer.tls_version = Some("SSLv2".into());
        assert!(matches!(
            RotationClient::from_config(&config),
            Err(RotationError::Config(message)) if message.contains("SSLv2")
        ));
    }
}
