//! OpenAPI document and Swagger UI.
//!
//! The document is generated once from the handler annotations and served
//! as static JSON at `/swagger/v1/swagger.json`; `/swagger` serves a Swagger
//! UI page pointed at it.

use std::sync::Arc;

use axum::{
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use utoipa::OpenApi;

use crate::http::{error, health, toggle};

pub const SPEC_PATH: &str = "/swagger/v1/swagger.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Flag Toggle Sample",
        description = "Evaluates boolean feature flags for an anonymous context."
    ),
    paths(toggle::get_toggle, health::health),
    components(schemas(error::ErrorBody, health::HealthStatus)),
    tags(
        (name = "Toggles", description = "Feature flag evaluation"),
        (name = "Miscellaneous", description = "Service status")
    )
)]
pub struct ApiDoc;

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Flag Toggle Sample</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "/swagger/v1/swagger.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

/// Documentation routes: the UI page and the generated document.
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let doc = Arc::new(ApiDoc::openapi());

    Router::new()
        .route("/swagger", get(swagger_ui))
        .route("/swagger/", get(swagger_ui))
        .route("/swagger/index.html", get(swagger_ui))
        .route(
            SPEC_PATH,
            get(move || {
                let doc = doc.clone();
                async move {
                    ([(header::CACHE_CONTROL, "no-store")], Json(doc.as_ref())).into_response()
                }
            }),
        )
}

async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI)
}
