//! Retry on transient API errors.
//!
//! # Responsibilities
//! - Re-run an operation while it fails with a transient remote code
//! - Stop after `max_retries` retries and surface the last error unchanged
//! - Never retry permanent, malformed or transport failures

use std::future::Future;

use tokio::time::sleep;

use crate::convergence::policy::{RetryPolicy, TransientCodes};
use crate::error::RotationResult;
use crate::observability::{Diagnostic, DiagnosticSink};

/// Run `operation`, retrying transient failures up to the policy's budget.
///
/// At most `max_retries + 1` attempts are made.
pub async fn retry_transient<T, F, Fut>(
    action: &'static str,
    policy: &RetryPolicy,
    transient: &TransientCodes,
    sink: &dyn DiagnosticSink,
    mut operation: F,
) -> RotationResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RotationResult<T>>,
{
    let mut retries = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let remote = match err.remote() {
            Some(remote) if retries < policy.max_retries && transient.contains(remote.code) => {
                remote.clone()
            }
            _ => return Err(err),
        };

        retries += 1;
        sink.emit(Diagnostic::TransientRetry {
            action,
            code: remote.code,
            message: remote.message,
            attempt: retries,
            wait: policy.wait_interval,
        });
        sleep(policy.wait_interval).await;
    }
}
