//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject a missing SDK key before anything is started
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::{FlagSourceConfig, ServiceConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("flags.sdk_key must not be empty")]
    EmptySdkKey,

    #[error("flags.sdk_key contains characters not allowed in an HTTP header")]
    MalformedSdkKey,

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("flags.source.base_uri is not a valid URL: {0}")]
    InvalidBaseUri(String),

    #[error("flags.source.path must not be empty")]
    EmptyFlagFilePath,
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.flags.sdk_key.trim().is_empty() {
        errors.push(ValidationError::EmptySdkKey);
    } else if HeaderValue::from_str(&config.flags.sdk_key).is_err() {
        errors.push(ValidationError::MalformedSdkKey);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.request_secs"));
    }

    match &config.flags.source {
        FlagSourceConfig::Polling {
            base_uri,
            poll_interval_secs,
            timeout_secs,
        } => {
            if url::Url::parse(base_uri).is_err() {
                errors.push(ValidationError::InvalidBaseUri(base_uri.clone()));
            }
            if *poll_interval_secs == 0 {
                errors.push(ValidationError::ZeroDuration("flags.source.poll_interval_secs"));
            }
            if *timeout_secs == 0 {
                errors.push(ValidationError::ZeroDuration("flags.source.timeout_secs"));
            }
        }
        FlagSourceConfig::File { path, .. } => {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::EmptyFlagFilePath);
            }
        }
        FlagSourceConfig::Offline { .. } => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
