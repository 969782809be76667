//! Polling data source.
//!
//! # Responsibilities
//! - Fetch the full flag set from the backend with the SDK key
//! - Use ETags so unchanged data is not re-downloaded
//! - Keep the last good snapshot when a poll fails
//!
//! # Wire format
//! ```text
//! GET {base_uri}/sdk/latest-all
//! Authorization: <sdk key>
//! If-None-Match: <last etag>
//!
//! 200 {"flags": {"<key>": {"on": true, "variations": [true, false], ...}}, "segments": {...}}
//! 304 (unchanged)   401/403 (key rejected)
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION, ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use tokio::sync::broadcast;
use url::Url;

use crate::flags::error::FlagClientError;
use crate::flags::logging::LogSink;
use crate::flags::model::FlagSnapshot;
use crate::flags::store::FlagStore;
use crate::observability::metrics;

const LATEST_FLAGS_PATH: &str = "sdk/latest-all";

#[derive(Debug)]
pub enum PollOutcome {
    Updated(FlagSnapshot),
    NotModified,
}

/// Build the flag data URL, keeping any path prefix on `base_uri`.
pub fn latest_flags_url(base_uri: &str) -> Result<Url, FlagClientError> {
    let mut base = Url::parse(base_uri)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(LATEST_FLAGS_PATH)?)
}

pub struct PollingSource {
    http: reqwest::Client,
    endpoint: Url,
    sdk_key: HeaderValue,
    interval: Duration,
    etag: Option<String>,
}

impl PollingSource {
    pub fn new(
        base_uri: &str,
        sdk_key: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Result<Self, FlagClientError> {
        let mut sdk_key =
            HeaderValue::from_str(sdk_key).map_err(|_| FlagClientError::MalformedSdkKey)?;
        sdk_key.set_sensitive(true);

        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: latest_flags_url(base_uri)?,
            sdk_key,
            interval,
            etag: None,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Perform one poll.
    pub async fn fetch(&mut self) -> Result<PollOutcome, FlagClientError> {
        let mut request = self
            .http
            .get(self.endpoint.clone())
            .header(AUTHORIZATION, self.sdk_key.clone());
        if let Some(etag) = &self.etag {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await?;
        let status = response.status();

        match status {
            StatusCode::NOT_MODIFIED => Ok(PollOutcome::NotModified),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(FlagClientError::InvalidSdkKey {
                    status: status.as_u16(),
                })
            }
            s if s.is_success() => {
                let etag = response
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let body = response.bytes().await?;
                let snapshot: FlagSnapshot = serde_json::from_slice(&body)?;
                self.etag = etag;
                Ok(PollOutcome::Updated(snapshot))
            }
            s => Err(FlagClientError::UnexpectedStatus(s.as_u16())),
        }
    }

    /// Poll until shutdown, publishing every new snapshot into `store`.
    pub async fn run(
        mut self,
        store: Arc<FlagStore>,
        sink: Arc<dyn LogSink>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        sink.debug(&format!(
            "polling {} every {:?}",
            self.endpoint, self.interval
        ));

        // Without data yet, retry at once instead of waiting a full period.
        let mut delay = if store.initialized() {
            jittered(self.interval)
        } else {
            Duration::ZERO
        };

        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.recv() => {
                    sink.debug("flag poller received shutdown signal");
                    break;
                }
            }

            delay = jittered(self.interval);
            match self.fetch().await {
                Ok(PollOutcome::Updated(snapshot)) => {
                    metrics::record_flag_poll("updated");
                    sink.debug(&format!("received {} flags", snapshot.len()));
                    store.replace(snapshot);
                }
                Ok(PollOutcome::NotModified) => {
                    metrics::record_flag_poll("not_modified");
                }
                Err(FlagClientError::InvalidSdkKey { status }) => {
                    metrics::record_flag_poll("rejected");
                    sink.error(&format!(
                        "SDK key rejected (HTTP {}); polling stopped, serving last known flags",
                        status
                    ));
                    break;
                }
                Err(e) => {
                    metrics::record_flag_poll("failed");
                    sink.warn(&format!("flag poll failed, keeping previous flags: {}", e));
                }
            }
        }
    }
}

/// Poll period plus up to 10% jitter.
fn jittered(interval: Duration) -> Duration {
    let jitter_range = interval.as_millis() as u64 / 10;
    let jitter = if jitter_range > 0 {
        fastrand::u64(0..jitter_range)
    } else {
        0
    };
    interval + Duration::from_millis(jitter)
}
