//! Configuration schema definitions.
//!
//! Only `[load_balancer]` is required; every other section falls back to
//! its defaults when omitted.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::convergence::policy::{
    TransientCodes, DEFAULT_MAX_RETRIES, DEFAULT_WAIT_INTERVAL, DEVICE_BUSY,
};
use crate::transport::TlsVersion;

/// Root configuration for the rotation client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RotationConfig {
    /// Load balancer address and credentials.
    pub load_balancer: LoadBalancerConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub retries: RetryConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Load balancer connection settings.
#[derive(Clone, Deserialize, Serialize)]
pub struct LoadBalancerConfig {
    /// Scheme, host and optional port, e.g. "https://lb.example.com".
    pub scheme_host: String,

    pub username: String,

    pub password: String,

    /// Verify the device's TLS certificate.
    pub verify: bool,

    /// SSLv23, TLSv1, TLSv1_1 or TLSv1_2. Unset negotiates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_version: Option<String>,
}

impl LoadBalancerConfig {
    pub fn tls_version(&self) -> Result<Option<TlsVersion>, String> {
        TlsVersion::from_setting(self.tls_version.as_deref())
    }
}

impl fmt::Debug for LoadBalancerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadBalancerConfig")
            .field("scheme_host", &self.scheme_host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verify", &self.verify)
            .field("tls_version", &self.tls_version)
            .finish()
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request timeout (connect + response) in seconds.
    pub request_secs: u64,
}

impl TimeoutConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Retry and polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Default budget for enable/disable when none is given per call.
    pub max_retries: u32,

    /// Sleep between attempts in milliseconds.
    pub wait_interval_ms: u64,

    /// Remote error codes that are retried.
    pub transient_codes: Vec<i64>,
}

impl RetryConfig {
    pub fn wait_interval(&self) -> Duration {
        Duration::from_millis(self.wait_interval_ms)
    }

    pub fn transient_codes(&self) -> TransientCodes {
        TransientCodes::from_codes(self.transient_codes.iter().copied())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            wait_interval_ms: DEFAULT_WAIT_INTERVAL.as_millis() as u64,
            transient_codes: vec![DEVICE_BUSY],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Commented starting point for a configuration file.
pub const DEFAULT_TEMPLATE: &str = r#"# Load balancer rotation client configuration.

[load_balancer]
scheme_host = "https://lb.example.com"
username = "username"
password = "password"
# Set to false for devices with self-signed certificates.
verify = true
# Pin the protocol: SSLv23, TLSv1, TLSv1_1 or TLSv1_2.
# tls_version = "TLSv1_2"

[timeouts]
request_secs = 30

[retries]
max_retries = 5
wait_interval_ms = 2000
# Device busy.
transient_codes = [67174416]

[observability]
# trace, debug, info, warn or error; RUST_LOG overrides.
log_level = "warn"
"#;
