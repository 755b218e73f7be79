//! Session lifecycle.
//!
//! # Data Flow
//! ```text
//! scoped(body)
//!     → authenticate (no session → AuthenticationFailure, nothing to close)
//!     → body(session token)
//!     → session.close (always, once)
//!     → body result, or the close failure if the body succeeded
//! ```
//!
//! # Design Decisions
//! - A close failure never masks a failure from the body; it is reported
//!   to the diagnostic sink instead
//! - The token is handed to the body by value and is dead once the scope ends

use std::future::Future;
use std::sync::Arc;

use crate::api::{CommandFactory, Credentials, Endpoint, SessionToken};
use crate::error::RotationResult;
use crate::observability::{Diagnostic, DiagnosticSink};

/// Opens and closes sessions around a block of commands.
#[derive(Clone)]
pub struct SessionManager {
    endpoint: Endpoint,
    credentials: Credentials,
    commands: CommandFactory,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl SessionManager {
    pub fn new(
        endpoint: Endpoint,
        credentials: Credentials,
        commands: CommandFactory,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            endpoint,
            credentials,
            commands,
            diagnostics,
        }
    }

    /// Run `body` inside a fresh session, closing it on every exit path.
    pub async fn scoped<T, F, Fut>(&self, body: F) -> RotationResult<T>
    where
        F: FnOnce(SessionToken) -> Fut,
        Fut: Future<Output = RotationResult<T>>,
    {
        let session = self
            .commands
            .session_start(&self.endpoint, &self.credentials)
            .send()
            .await?;
        self.diagnostics.emit(Diagnostic::SessionOpened {
            endpoint: self.endpoint.to_string(),
        });

        let outcome = body(session.clone()).await;
        let closed = self.commands.session_end(&self.endpoint, &session).send().await;

        match (outcome, closed) {
            (Ok(value), Ok(_)) => {
                self.emit_closed();
                Ok(value)
            }
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(_)) => {
                self.emit_closed();
                Err(err)
            }
            (Err(err), Err(close_err)) => {
                self.diagnostics.emit(Diagnostic::SessionCloseFailed {
                    endpoint: self.endpoint.to_string(),
                    error: close_err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn emit_closed(&self) {
        self.diagnostics.emit(Diagnostic::SessionClosed {
            endpoint: self.endpoint.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RemoteError, RotationError};
    use crate::observability::RecordingSink;
    use crate::transport::testing::{fail_reply, ok_reply, ScriptedTransport};
    use serde_json::json;

    fn manager(transport: Arc<ScriptedTransport>, sink: Arc<RecordingSink>) -> SessionManager {
        SessionManager::new(
            Endpoint::parse("https://lb.example.com").unwrap(),
            Credentials::new("user", "password"),
            CommandFactory::new(transport),
            sink,
        )
    }

    fn status_failure() -> RotationError {
        RotationError::NodeStatusFailure {
            context: "Could not get status of app1".to_string(),
            remote: RemoteError::new("boom", 1),
        }
    }

    #[tokio::test]
    async fn test_body_sees_session_and_session_is_closed() {
        let transport = Arc::new(ScriptedTransport::with_session());
        let sink = Arc::new(RecordingSink::new());

        let token = manager(transport.clone(), sink.clone())
            .scoped(|session| async move { Ok::<_, RotationError>(session.as_str().to_string()) })
            .await
            .unwrap();

        assert_eq!(token, "1234");
        assert_eq!(transport.actions(), vec!["authenticate", "session.close"]);
        assert_eq!(transport.requests()[1].param("session_id"), Some("1234"));
    }

    #[tokio::test]
    async fn test_body_failure_still_closes_session() {
        let transport = Arc::new(ScriptedTransport::with_session());
        let sink = Arc::new(RecordingSink::new());

        let result: RotationResult<()> = manager(transport.clone(), sink)
            .scoped(|_| async { Err(status_failure()) })
            .await;

        assert!(matches!(result, Err(RotationError::NodeStatusFailure { .. })));
        assert_eq!(transport.count("session.close"), 1);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_mask_body_failure() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .script("authenticate", [json!({ "session_id": "1234" })])
                .script("session.close", [fail_reply("Invalid session", 1009)]),
        );
        let sink = Arc::new(RecordingSink::new());

        let result: RotationResult<()> = manager(transport, sink.clone())
            .scoped(|_| async { Err(status_failure()) })
            .await;

        assert!(matches!(result, Err(RotationError::NodeStatusFailure { .. })));
        assert!(sink
            .events()
            .iter()
            .any(|e| matches!(e, Diagnostic::SessionCloseFailed { .. })));
    }

    #[tokio::test]
    async fn test_close_failure_surfaces_when_body_succeeds() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .script("authenticate", [json!({ "session_id": "1234" })])
                .script("session.close", [fail_reply("Invalid session", 1009)]),
        );
        let sink = Arc::new(RecordingSink::new());

        let result = manager(transport, sink).scoped(|_| async { Ok::<_, RotationError>(1) }).await;
        assert!(matches!(result, Err(RotationError::SessionCloseFailure { .. })));
    }

    #[tokio::test]
    async fn test_no_close_without_session() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .script("authenticate", [fail_reply("Invalid username or password", 520)])
                .script("session.close", [ok_reply()]),
        );
        let sink = Arc::new(RecordingSink::new());
        let mut ran = false;

        let result = manager(transport.clone(), sink)
            .scoped(|_| {
                ran = true;
                async { Ok::<_, RotationError>(()) }
            })
            .await;

        assert!(matches!(result, Err(RotationError::AuthenticationFailure { .. })));
        assert!(!ran);
        assert_eq!(transport.count("session.close"), 0);
    }
}
