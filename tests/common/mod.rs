//! Shared utilities for integration tests: a fake load balancer on wiremock.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use node_rotation::{Credentials, Endpoint, HttpTransport, RecordingSink, RotationClient, TransportConfig};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const API_PATH: &str = "/services/rest/v2/";
pub const SESSION_ID: &str = "1234";
pub const DEVICE_BUSY: i64 = 67_174_416;

/// Replies with each body in turn, repeating the last one.
pub struct Sequence {
    replies: Vec<Value>,
    next: AtomicUsize,
}

impl Sequence {
    pub fn new(replies: Vec<Value>) -> Self {
        Self {
            replies,
            next: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let idx = n.min(self.replies.len().saturating_sub(1));
        ResponseTemplate::new(200).set_body_json(&self.replies[idx])
    }
}

pub fn ok_reply() -> Value {
    json!({ "response": { "status": "OK" } })
}

pub fn fail_reply(msg: &str, code: i64) -> Value {
    json!({ "response": { "status": "fail", "err": { "msg": msg, "code": code } } })
}

pub fn status_reply(enabled: bool) -> Value {
    json!({ "server": { "name": "app1.example.com", "status": if enabled { 1 } else { 0 } } })
}

pub fn conns_reply(count: u64) -> Value {
    json!({ "server_stat": { "name": "app1.example.com", "cur_conns": count } })
}

/// A wiremock server speaking the load balancer's REST dialect.
pub struct FakeLoadBalancer {
    pub server: MockServer,
}

impl FakeLoadBalancer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Start with working authenticate and session.close.
    pub async fn with_session() -> Self {
        let lb = Self::start().await;
        lb.reply("GET", "authenticate", vec![json!({ "session_id": SESSION_ID })]).await;
        lb.reply("POST", "session.close", vec![ok_reply()]).await;
        lb
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Answer `action` requests with `replies` in order.
    pub async fn reply(&self, http_method: &str, action: &str, replies: Vec<Value>) {
        Mock::given(method(http_method))
            .and(path(API_PATH))
            .and(query_param("method", action))
            .respond_with(Sequence::new(replies))
            .mount(&self.server)
            .await;
    }

    pub async fn reply_raw(&self, http_method: &str, action: &str, template: ResponseTemplate) {
        Mock::given(method(http_method))
            .and(path(API_PATH))
            .and(query_param("method", action))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    /// Requests received for `action`, oldest first.
    pub async fn requests(&self, action: &str) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| query(r, "method").as_deref() == Some(action))
            .collect()
    }

    pub async fn count(&self, action: &str) -> usize {
        self.requests(action).await.len()
    }

    /// Client against this server with no waiting between attempts.
    pub fn client(&self) -> (RotationClient, Arc<RecordingSink>) {
        let transport = HttpTransport::new(&TransportConfig {
            verify_tls: true,
            request_timeout: Duration::from_secs(5),
            tls_version: None,
        })
        .unwrap();
        let sink = Arc::new(RecordingSink::new());
        let client = RotationClient::new(
            Endpoint::parse(&self.uri()).unwrap(),
            Credentials::new("admin", "secret"),
            Arc::new(transport),
        )
        .with_wait_interval(Duration::ZERO)
        .with_diagnostics(sink.clone());
        (client, sink)
    }
}

/// Value of query parameter `name` on a received request.
pub fn query(request: &Request, name: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Query parameter names in the order they were sent.
pub fn query_keys(request: &Request) -> Vec<String> {
    request
        .url
        .query_pairs()
        .map(|(key, _)| key.into_owned())
        .collect()
}
