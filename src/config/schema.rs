//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the toggle service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Flag client settings.
    pub flags: FlagsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// API documentation settings.
    pub docs: DocsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Flag client configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FlagsConfig {
    /// Secret key authenticating this process to the flag backend.
    pub sdk_key: String,

    /// Value served when a flag cannot be evaluated.
    pub default_value: bool,

    /// How long startup waits for the first flag data, in seconds.
    pub start_wait_secs: u64,

    /// Where flag definitions come from.
    pub source: FlagSourceConfig,
}

impl Default for FlagsConfig {
    fn default() -> Self {
        Self {
            sdk_key: String::new(),
            default_value: false,
            start_wait_secs: 5,
            source: FlagSourceConfig::default(),
        }
    }
}

// Keep the key out of logs.
impl fmt::Debug for FlagsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagsConfig")
            .field("sdk_key", &"<redacted>")
            .field("default_value", &self.default_value)
            .field("start_wait_secs", &self.start_wait_secs)
            .field("source", &self.source)
            .finish()
    }
}

/// Flag data source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FlagSourceConfig {
    /// Poll the flag backend over HTTP.
    Polling {
        #[serde(default = "default_base_uri")]
        base_uri: String,
        #[serde(default = "default_poll_interval")]
        poll_interval_secs: u64,
        #[serde(default = "default_poll_timeout")]
        timeout_secs: u64,
    },
    /// Read a JSON flag file, optionally reloading it on change.
    File {
        path: PathBuf,
        #[serde(default)]
        watch: bool,
    },
    /// Fixed values from this config; no network.
    Offline {
        #[serde(default)]
        values: HashMap<String, bool>,
    },
}

impl Default for FlagSourceConfig {
    fn default() -> Self {
        FlagSourceConfig::Polling {
            base_uri: default_base_uri(),
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_poll_timeout(),
        }
    }
}

impl FlagSourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            FlagSourceConfig::Polling { .. } => "polling",
            FlagSourceConfig::File { .. } => "file",
            FlagSourceConfig::Offline { .. } => "offline",
        }
    }
}

fn default_base_uri() -> String {
    "http://127.0.0.1:8030".to_string()
}

fn default_poll_interval() -> u64 {
    30
}

fn default_poll_timeout() -> u64 {
    10
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Console log format.
    pub log_format: LogFormat,

    /// Filter directives used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Value of the `application` field on request and startup spans.
    pub application_name: String,

    /// Enable the Prometheus metrics listener.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            log_filter: "flag_toggle_service=info,flag_client=info,tower_http=info".to_string(),
            application_name: env!("CARGO_PKG_NAME").to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// API documentation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Serve `/swagger` and `/swagger/v1/swagger.json`.
    pub enabled: bool,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
