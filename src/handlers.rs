use crate::errors::{AppError, ValidationError};
use crate::models::{LeadForm, SubmitResponse};
use crate::submission::SubmissionHandler;
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Form, Json,
};
use serde_json::json;
use std::sync::Arc;

pub const MALFORMED_FORM: &str = "The form submission could not be read";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lead submission pipeline.
    pub submissions: SubmissionHandler,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-capture-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/leads
///
/// Accepts the website's lead form (`application/x-www-form-urlencoded`).
///
/// # Returns
///
/// * `200 {"success": true, "externalProfileId": ...}` when stored.
/// * `400` with per-field messages (or a `form` issue when the body cannot be
///   decoded), `401` when CAPTCHA fails, `500` when the submission could not
///   be stored and should be resent.
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    form: Result<Form<LeadForm>, FormRejection>,
) -> Result<Json<SubmitResponse>, AppError> {
    tracing::info!("POST /api/v1/leads");

    let Form(form) = form.map_err(|rejection| {
        tracing::debug!("Undecodable lead form: {}", rejection.body_text());
        let mut errors = ValidationError::default();
        errors.push("form", MALFORMED_FORM);
        AppError::Validation(errors)
    })?;

    let response = state.submissions.submit(form).await?;
    Ok(Json(response))
}

/// Serves the OpenAPI specification YAML file.
pub async fn serve_openapi_spec() -> impl IntoResponse {
    match tokio::fs::read_to_string("openapi.yml").await {
        Ok(content) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/yaml")],
            content,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "OpenAPI spec not found").into_response(),
    }
}

/// Serves a Swagger UI page that loads `/api-docs/openapi.yml`.
pub async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Lead Capture API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.yml",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}
