use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header the service uses to report why a value was served.
pub const FLAG_REASON_HEADER: &str = "x-flag-reason";

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// A toggle value together with the service's evaluation reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleDetail {
    pub value: bool,
    pub reason: Option<String>,
}

impl ToggleDetail {
    /// True when the service fell back to its default value.
    pub fn is_default(&self) -> bool {
        self.reason
            .as_deref()
            .map(|r| r.starts_with("ERROR:"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub flags_initialized: bool,
    pub version: String,
}

pub struct ToggleClient {
    client: Client,
    base_url: String,
}

impl ToggleClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Evaluate a toggle.
    pub async fn get_toggle(&self, name: &str) -> Result<bool, SdkError> {
        Ok(self.get_toggle_detail(name).await?.value)
    }

    /// Evaluate a toggle and keep the reason header.
    pub async fn get_toggle_detail(&self, name: &str) -> Result<ToggleDetail, SdkError> {
        let resp = self
            .client
            .get(format!("{}/get-toggle", self.base_url))
            .query(&[("toggleName", name)])
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let reason = resp
            .headers()
            .get(FLAG_REASON_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let value = resp.json::<bool>().await?;

        Ok(ToggleDetail { value, reason })
    }

    pub async fn health(&self) -> Result<HealthStatus, SdkError> {
        let resp = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(check_status(resp).await?.json().await?)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, SdkError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SdkError::Status { status, body })
}
