//! Convergence subsystem.
//!
//! # Data Flow
//! ```text
//! Mutating command (enable / disable):
//!     → retries.rs (retry while the remote code is transient, bounded)
//!     → poll.rs (read connections or status until target, bounded)
//!     → caller re-reads status and reports the truth
//! ```
//!
//! # Design Decisions
//! - Error retry and state polling are separate: one reacts to a failure and
//!   must eventually re-raise it, the other reacts to an observed value and
//!   gives up silently
//! - Both are bounded purely by `RetryPolicy::max_retries`; no wall clock
//! - Fixed wait interval between attempts; the device is the bottleneck
//! - Transient codes are data, not branches

pub mod policy;
pub mod poll;
pub mod retries;

pub use policy::{RetryPolicy, TransientCodes, DEFAULT_MAX_RETRIES, DEFAULT_WAIT_INTERVAL};
pub use poll::{poll_until, wait_for_enabled, wait_for_zero_connections, PollOutcome};
pub use retries::retry_transient;
