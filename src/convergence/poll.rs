//! Bounded polling until remote state converges.
//!
//! # State Transitions
//! ```text
//! read → done?  yes → Converged
//!          no  → sleep → read ...   (at most max_retries reads)
//! budget spent → Exhausted (not an error)
//! ```
//!
//! Read failures still propagate; only non-convergence is silent.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::api::types::NodeStatus;
use crate::convergence::policy::RetryPolicy;
use crate::error::RotationResult;
use crate::observability::{Diagnostic, DiagnosticSink};

/// Result of a bounded poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Converged { value: T, waits: u32 },
    Exhausted { last: Option<T>, waits: u32 },
}

impl<T> PollOutcome<T> {
    pub fn is_converged(&self) -> bool {
        matches!(self, PollOutcome::Converged { .. })
    }

    pub fn waits(&self) -> u32 {
        match self {
            PollOutcome::Converged { waits, .. } | PollOutcome::Exhausted { waits, .. } => *waits,
        }
    }
}

/// Read state until `done` holds, sleeping between reads.
///
/// `on_wait` sees each unsatisfying value just before the sleep.
pub async fn poll_until<T, F, Fut, D, W>(
    policy: &RetryPolicy,
    mut read: F,
    mut done: D,
    mut on_wait: W,
) -> RotationResult<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RotationResult<T>>,
    D: FnMut(&T) -> bool,
    W: FnMut(&T, Duration),
{
    let mut waits = 0;
    let mut last = None;

    while waits < policy.max_retries {
        let value = read().await?;
        if done(&value) {
            return Ok(PollOutcome::Converged { value, waits });
        }

        on_wait(&value, policy.wait_interval);
        sleep(policy.wait_interval).await;
        waits += 1;
        last = Some(value);
    }

    Ok(PollOutcome::Exhausted { last, waits })
}

/// Poll the active connection count of `node` until it drains to zero.
pub async fn wait_for_zero_connections<F, Fut>(
    node: &str,
    policy: &RetryPolicy,
    sink: &dyn DiagnosticSink,
    read_connections: F,
) -> RotationResult<PollOutcome<u64>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RotationResult<u64>>,
{
    poll_until(
        policy,
        read_connections,
        |conns| *conns == 0,
        |conns, wait| {
            sink.emit(Diagnostic::ConnectionsDraining {
                node: node.to_string(),
                remaining: *conns,
                wait,
            })
        },
    )
    .await
}

/// Poll the status of `node` until it reports enabled.
pub async fn wait_for_enabled<F, Fut>(
    node: &str,
    policy: &RetryPolicy,
    sink: &dyn DiagnosticSink,
    read_status: F,
) -> RotationResult<PollOutcome<NodeStatus>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RotationResult<NodeStatus>>,
{
    poll_until(
        policy,
        read_status,
        |status| *status == NodeStatus::Enabled,
        |status, wait| {
            sink.emit(Diagnostic::AwaitingEnabled {
                node: node.to_string(),
                status: *status,
                wait,
            })
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RotationError;
    use crate::observability::RecordingSink;
    use crate::transport::TransportError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::ZERO)
    }

    /// Replays `values`, repeating the last one.
    fn replay<T: Clone>(values: Vec<T>) -> impl FnMut() -> std::future::Ready<RotationResult<T>> {
        let queue = Mutex::new(VecDeque::from(values));
        move || {
            let mut queue = queue.lock().unwrap();
            let value = if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            };
            std::future::ready(Ok(value))
        }
    }

    #[tokio::test]
    async fn test_connections_drain_after_two_waits() {
        let sink = RecordingSink::new();
        let outcome = wait_for_zero_connections("app1", &policy(5), &sink, replay(vec![3u64, 1, 0]))
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Converged { value: 0, waits: 2 });
        assert_eq!(sink.waits(), 2);
        assert_eq!(
            sink.events()[0],
            Diagnostic::ConnectionsDraining {
                node: "app1".to_string(),
                remaining: 3,
                wait: Duration::ZERO
            }
        );
    }

    #[tokio::test]
    async fn test_exhaustion_is_not_an_error() {
        let sink = RecordingSink::new();
        let outcome = wait_for_zero_connections("app1", &policy(3), &sink, replay(vec![9u64]))
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Exhausted { last: Some(9), waits: 3 });
        assert!(!outcome.is_converged());
    }

    #[tokio::test]
    async fn test_zero_budget_reads_nothing() {
        let sink = RecordingSink::new();
        let mut reads = 0;
        let outcome = poll_until(
            &policy(0),
            || {
                reads += 1;
                std::future::ready(Ok::<_, RotationError>(1u64))
            },
            |_| true,
            |_, _| {},
        )
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::Exhausted { last: None, waits: 0 });
        assert_eq!(reads, 0);
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_enabled_after_two_waits() {
        let sink = RecordingSink::new();
        let statuses = vec![NodeStatus::Disabled, NodeStatus::Disabled, NodeStatus::Enabled];
        let outcome = wait_for_enabled("app1", &policy(5), &sink, replay(statuses))
            .await
            .unwrap();

        assert_eq!(outcome.waits(), 2);
        assert!(outcome.is_converged());
    }

    #[tokio::test]
    async fn test_read_failure_propagates() {
        let result = poll_until(
            &policy(5),
            || {
                std::future::ready(Err::<u64, _>(RotationError::Transport(TransportError::Decode {
                    detail: "truncated".to_string(),
                })))
            },
            |c| *c == 0,
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(RotationError::Transport(_))));
    }
}
