//! Counters for convergence behaviour.
//!
//! # Metrics
//! - `rotation_transient_retries_total` (counter): retries after transient API errors, by action
//! - `rotation_poll_waits_total` (counter): sleeps while polling, by poll kind
//! - `rotation_unconverged_total` (counter): operations that ran out of budget, by target state
//!
//! Without an installed recorder these are no-ops.

pub fn record_transient_retry(action: &'static str) {
    metrics::counter!("rotation_transient_retries_total", "action" => action).increment(1);
}

pub fn record_poll_wait(kind: &'static str) {
    metrics::counter!("rotation_poll_waits_total", "kind" => kind).increment(1);
}

pub fn record_unconverged(target: &'static str) {
    metrics::counter!("rotation_unconverged_total", "target" => target).increment(1);
}
