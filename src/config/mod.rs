//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (ProxyConfig::default)
//!     → loader.rs (optional TOML file, parse & deserialize)
//!     → NEXT_PUBLIC_A2A_URL (ProxyConfig::apply_env)
//!     → CLI flags (main.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → BackendUrl handed to the proxy handler and the fetch wrapper
//! ```
//!
//! # Design Decisions
//! - Config is resolved once at startup and never mutated
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendConfig, BackendUrl, BackendUrlError, LimitsConfig, ListenerConfig,
    ObservabilityConfig, ProxyConfig, BACKEND_URL_ENV, DEFAULT_BACKEND_URL,
};
pub use validation::{validate_config, ValidationError};
