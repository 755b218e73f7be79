//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! api command
//!     → ApiRequest (method, url, ordered query params)
//!     → Transport::execute
//!         - http.rs: reqwest client (TLS verify, timeout)
//!     → serde_json::Value (decoded body) or TransportError
//! ```
//!
//! # Design Decisions
//! - The transport never interprets HTTP status; API failures live in the JSON body
//! - Parameters stay ordered so requests are reproducible and comparable
//! - Object-safe trait so the client can hold `Arc<dyn Transport>`

pub mod http;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use url::Url;

pub use http::{HttpTransport, TlsVersion, TransportConfig};

/// HTTP method used for an API action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// A fully formatted API request.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub params: Vec<(String, String)>,
}

impl ApiRequest {
    /// Value of the first query parameter called `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The `method` query parameter, i.e. the API action.
    pub fn action(&self) -> Option<&str> {
        self.param("method")
    }
}

// Credentials travel as query parameters; keep them out of logs.
impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(key, value)| {
                if key == "password" {
                    (key.as_str(), "<redacted>")
                } else {
                    (key.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("params", &params)
            .finish()
    }
}

/// Errors raised below the API layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS, or timeout failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not valid JSON.
    #[error("Could not decode response body as JSON: {detail}")]
    Decode { detail: String },

    /// The HTTP client could not be constructed.
    #[error("Could not build HTTP client: {0}")]
    Build(String),
}

/// Capability to send one API request and decode its JSON response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError>;
}
