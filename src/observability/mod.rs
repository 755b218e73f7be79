//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! session / convergence / client scope
//!     → diagnostics.rs (Diagnostic events through an injected sink)
//!         - TracingSink → tracing events + metrics.rs counters
//!         - RecordingSink → in-memory list
//!
//! Binary startup:
//!     → logging.rs (tracing-subscriber with EnvFilter, stderr)
//! ```
//!
//! # Design Decisions
//! - No hidden global logger in the core; the sink is passed in
//! - Each client operation runs in a span with a correlation id

pub mod diagnostics;
pub mod logging;
pub mod metrics;

pub use diagnostics::{Diagnostic, DiagnosticSink, RecordingSink, TracingSink};
