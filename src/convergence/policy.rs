//! Retry budget and transient error classification.

use std::collections::BTreeSet;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 5;

pub const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_secs(2);

/// Code the device returns while it is busy applying another change.
pub const DEVICE_BUSY: i64 = 67_174_416;

/// How many times to retry or poll, and how long to sleep in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub wait_interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, wait_interval: Duration) -> Self {
        Self {
            max_retries,
            wait_interval,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_WAIT_INTERVAL)
    }
}

/// Remote error codes worth retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientCodes(BTreeSet<i64>);

impl TransientCodes {
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn from_codes(codes: impl IntoIterator<Item = i64>) -> Self {
        Self(codes.into_iter().collect())
    }

    pub fn insert(&mut self, code: i64) -> bool {
        self.0.insert(code)
    }

    pub fn contains(&self, code: i64) -> bool {
        self.0.contains(&code)
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }
}

impl Default for TransientCodes {
    fn default() -> Self {
        Self::from_codes([DEVICE_BUSY])
    }
}
