//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID set / propagated)
//!     → toggle.rs (GET /get-toggle → FlagEvaluator)
//!     → JSON boolean + x-flag-reason header
//! ```

pub mod docs;
pub mod error;
pub mod health;
pub mod middleware;
pub mod request;
pub mod server;
pub mod toggle;

pub use error::{ApiError, ErrorBody};
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
pub use toggle::FLAG_REASON_HEADER;
