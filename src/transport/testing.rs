//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::transport::{ApiRequest, Transport, TransportError};

/// Replies to each API action from a per-action script.
///
/// Replies are consumed in order; the last reply for an action is repeated
/// once the script runs out. Every request is recorded.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Value>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue replies for `action`.
    pub(crate) fn script(self, action: &str, replies: impl IntoIterator<Item = Value>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(action.to_string())
            .or_default()
            .extend(replies);
        self
    }

    /// Transport with working session start/close.
    pub(crate) fn with_session() -> Self {
        Self::new()
            .script("authenticate", [json!({ "session_id": "1234" })])
            .script("session.close", [ok_reply()])
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests sent for `action`.
    pub(crate) fn count(&self, action: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.action() == Some(action))
            .count()
    }

    /// Actions in the order they were sent.
    pub(crate) fn actions(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.action().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let action = request.action().unwrap_or_default().to_string();
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.get_mut(&action).ok_or_else(|| TransportError::Decode {
            detail: format!("no scripted reply for {}", action),
        })?;

        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        reply.ok_or_else(|| TransportError::Decode {
            detail: format!("empty script for {}", action),
        })
    }
}

pub(crate) fn ok_reply() -> Value {
    json!({ "response": { "status": "OK" } })
}

pub(crate) fn fail_reply(msg: &str, code: i64) -> Value {
    json!({ "response": { "status": "fail", "err": { "msg": msg, "code": code } } })
}

pub(crate) fn status_reply(enabled: bool) -> Value {
    json!({ "server": { "status": if enabled { 1 } else { 0 } } })
}

pub(crate) fn conns_reply(count: u64) -> Value {
    json!({ "server_stat": { "cur_conns": count } })
}
