//! `GET /get-toggle`: evaluate one boolean flag.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::flags::EvaluationContext;
use crate::http::error::ApiError;
use crate::http::server::AppState;

pub const TOGGLE_TAG: &str = "Toggles";
pub const TOGGLE_NAME_PARAM: &str = "toggleName";

/// Response header carrying the evaluation reason, e.g. `FALLTHROUGH` or
/// `ERROR:FLAG_NOT_FOUND`.
pub const FLAG_REASON_HEADER: &str = "x-flag-reason";

#[derive(Debug, Deserialize)]
pub struct ToggleQuery {
    #[serde(rename = "toggleName")]
    pub toggle_name: Option<String>,
}

/// Evaluate a boolean flag for the anonymous `minimal` context.
///
/// Unknown flags and an unreachable flag backend both yield the configured
/// default; only `x-flag-reason` tells them apart from a real `false`.
#[utoipa::path(
    get,
    path = "/get-toggle",
    tag = TOGGLE_TAG,
    operation_id = "get_toggle",
    summary = "Evaluate a boolean feature flag",
    params(
        ("toggleName" = String, Query, description = "Key of the flag to evaluate")
    ),
    responses(
        (
            status = 200,
            description = "Flag value, or the default when the flag cannot be evaluated",
            body = bool,
            content_type = "application/json",
            headers(
                ("x-flag-reason" = String, description = "Evaluation reason, prefixed with ERROR: when the default was served")
            )
        ),
        (status = 400, description = "`toggleName` is missing", body = crate::http::error::ErrorBody)
    )
)]
pub async fn get_toggle(
    State(state): State<AppState>,
    query: Result<Query<ToggleQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::InvalidQuery(rejection.body_text()))?;
    let toggle_name = query
        .toggle_name
        .ok_or(ApiError::MissingParameter(TOGGLE_NAME_PARAM))?;

    let detail = state.flags.bool_variation_detail(
        &toggle_name,
        &EvaluationContext::minimal(),
        state.default_value,
    );

    tracing::debug!(
        toggle = %toggle_name,
        value = detail.value,
        reason = %detail.reason,
        "Toggle evaluated"
    );

    Ok((
        [(FLAG_REASON_HEADER, detail.reason.to_string())],
        Json(detail.value),
    ))
}
