//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env (optional, dotenvy)
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, TOGGLE_* env overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to startup, which builds every subsystem from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs; only the SDK key is required
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DocsConfig, FlagSourceConfig, FlagsConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ServiceConfig, TimeoutConfig,
};
