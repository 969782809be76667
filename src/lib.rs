//! Flag toggle service library.

pub mod config;
pub mod flags;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use flags::{FlagClient, FlagEvaluator};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
