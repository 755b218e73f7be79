//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! --config PATH, or first existing file on the search path
//!     → loader.rs (read & deserialize TOML)
//!     → validation.rs (semantic checks)
//!     → RotationConfig (validated, immutable)
//!     → RotationClient::from_config
//! ```
//!
//! # Design Decisions
//! - Config is read once per invocation; there is no reload
//! - Everything except `[load_balancer]` has a default
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{discover_config, load_config, parse_config, search_paths, ConfigError};
pub use schema::{
    LoadBalancerConfig, ObservabilityConfig, RetryConfig, RotationConfig, TimeoutConfig,
    DEFAULT_TEMPLATE,
};
pub use validation::{validate_config, ValidationError};
