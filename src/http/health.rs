use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::http::server::AppState;

pub const MISC_TAG: &str = "Miscellaneous";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    /// Whether flag data has been received; `false` means defaults are served.
    pub flags_initialized: bool,
    pub version: String,
}

/// Liveness probe; always 200 while the process is serving.
#[utoipa::path(
    get,
    path = "/health",
    tag = MISC_TAG,
    operation_id = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthStatus)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        flags_initialized: state.flags.initialized(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
