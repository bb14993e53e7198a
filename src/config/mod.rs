//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → consumed once while the router is built
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the router is built from it exactly once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AgentConfig, GatewayConfig, ListenerConfig, LoadingConfig, LogFormat, ObservabilityConfig,
    SecurityConfig, SystemConfig, TlsConfig,
};
