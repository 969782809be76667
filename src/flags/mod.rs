//! Flag client subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     FlagsConfig + LogSink
//!     → client.rs (validate key, pick source, initial load)
//!     → store.rs (snapshot published, client marked initialized)
//!
//! Background (one of):
//!     polling.rs  GET /sdk/latest-all every poll interval   → store.replace
//!     file.rs     flag file changed on disk                 → store.replace
//!     offline     values from config, never refreshed
//!
//! Request time:
//!     FlagEvaluator::bool_variation(key, context, default)
//!     → store.rs (current snapshot, lock-free)
//!     → model.rs (evaluate flag for context)
//!     → EvaluationDetail { value, reason }
//! ```
//!
//! # Design Decisions
//! - Evaluation never errors; failures become the caller's default plus a reason
//! - Only a rejected SDK key or local misconfiguration fails startup
//! - The client logs through an injected `LogSink`, not a global logger

pub mod api;
pub mod client;
pub mod context;
pub mod error;
pub mod file;
pub mod logging;
pub mod model;
pub mod polling;
pub mod store;

pub use api::FlagEvaluator;
pub use client::FlagClient;
pub use context::EvaluationContext;
pub use error::FlagClientError;
pub use logging::{LogSink, TracingLogSink};
pub use model::{ErrorKind, EvaluationDetail, EvaluationReason, FlagDefinition, FlagSnapshot};
pub use store::FlagStore;
