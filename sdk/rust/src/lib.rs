//! Typed client for the flag toggle service.

pub mod client;

pub use client::{HealthStatus, SdkError, ToggleClient, ToggleDetail};
