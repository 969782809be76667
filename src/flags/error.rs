//! Flag client errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while constructing or synchronizing the flag client.
///
/// Evaluation itself never fails: it falls back to the caller's default.
#[derive(Debug, Error)]
pub enum FlagClientError {
    /// No SDK key was configured.
    #[error("SDK key is empty")]
    EmptySdkKey,

    /// The flag backend refused the SDK key.
    #[error("SDK key rejected by flag backend (HTTP {status})")]
    InvalidSdkKey { status: u16 },

    /// The SDK key cannot be sent as an `Authorization` header.
    #[error("SDK key contains characters not allowed in an HTTP header")]
    MalformedSdkKey,

    #[error("invalid flag backend URI: {0}")]
    InvalidBaseUri(#[from] url::ParseError),

    #[error("flag backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from flag backend: HTTP {0}")]
    UnexpectedStatus(u16),

    #[error("failed to read flag file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse flag data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to watch flag file: {0}")]
    Watch(#[from] notify::Error),
}

impl FlagClientError {
    /// Errors that mean the process is misconfigured rather than the backend being down.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FlagClientError::EmptySdkKey
                | FlagClientError::InvalidSdkKey { .. }
                | FlagClientError::MalformedSdkKey
                | FlagClientError::InvalidBaseUri(_)
        )
    }
}
