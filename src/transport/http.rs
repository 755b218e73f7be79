//! reqwest-backed transport.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::transport::{ApiRequest, HttpMethod, Transport, TransportError};

/// Longest body excerpt kept in a decode error.
const BODY_EXCERPT_LEN: usize = 256;

/// TLS protocol version to pin connections to.
///
/// Names follow the device documentation: `SSLv23` negotiates the highest
/// version both sides support, the `TLSv1*` names pin one version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    Negotiate,
    Tls1_0,
    Tls1_1,
    Tls1_2,
}

impl TlsVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsVersion::Negotiate => "SSLv23",
            TlsVersion::Tls1_0 => "TLSv1",
            TlsVersion::Tls1_1 => "TLSv1_1",
            TlsVersion::Tls1_2 => "TLSv1_2",
        }
    }

    /// Parse an optional setting. Absent or blank means no pinning.
    pub fn from_setting(value: Option<&str>) -> Result<Option<Self>, String> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => name.parse().map(Some),
        }
    }

    fn pinned(&self) -> Option<reqwest::tls::Version> {
        match self {
            TlsVersion::Negotiate => None,
            TlsVersion::Tls1_0 => Some(reqwest::tls::Version::TLS_1_0),
            TlsVersion::Tls1_1 => Some(reqwest::tls::Version::TLS_1_1),
            TlsVersion::Tls1_2 => Some(reqwest::tls::Version::TLS_1_2),
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TlsVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SSLv23" => Ok(TlsVersion::Negotiate),
            "TLSv1" => Ok(TlsVersion::Tls1_0),
            "TLSv1_1" => Ok(TlsVersion::Tls1_1),
            "TLSv1_2" => Ok(TlsVersion::Tls1_2),
            "SSLv2" | "SSLv3" => Err(format!("TLS version '{}' is not supported", s)),
            other => Err(format!(
                "unknown TLS version '{}', expected SSLv23, TLSv1, TLSv1_1 or TLSv1_2",
                other
            )),
        }
    }
}

/// Settings for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Verify the load balancer's TLS certificate.
    pub verify_tls: bool,
    /// Total time allowed for one request/response.
    pub request_timeout: Duration,
    /// Pin the TLS protocol version; `None` negotiates.
    pub tls_version: Option<TlsVersion>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            verify_tls: true,
            request_timeout: Duration::from_secs(30),
            tls_version: None,
        }
    }
}

/// Transport that sends requests over HTTP(S) with reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from configuration.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        if !config.verify_tls {
            tracing::warn!("TLS certificate verification is disabled for the load balancer");
        }

        let mut builder = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(!config.verify_tls);

        if let Some(version) = config.tls_version.as_ref().and_then(TlsVersion::pinned) {
            tracing::debug!(tls_version = ?version, "Pinning TLS protocol version");
            builder = builder.min_tls_version(version).max_tls_version(version);
        }

        let client = builder.build().map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(request.url.clone()),
            HttpMethod::Post => self.client.post(request.url.clone()),
        };

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            action = request.action().unwrap_or("unknown"),
            "Sending load balancer request"
        );

        let response = builder.query(&request.params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::trace!(status = %status, body = %body, "Load balancer response");

        serde_json::from_str(&body).map_err(|e| TransportError::Decode {
            detail: format!("{} (status {}, body: {})", e, status, excerpt(&body)),
        })
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
