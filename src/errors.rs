use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// Form field name as submitted (e.g. `firstname`, `confirm-policies`).
    pub field: &'static str,
    /// Human-readable message shown next to the field.
    pub message: &'static str,
}

/// Every constraint a lead form failed. Never empty when returned as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn push(&mut self, field: &'static str, message: &'static str) {
        self.issues.push(FieldIssue { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if `field` has at least one issue.
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .issues
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or incomplete form input.
    Validation(ValidationError),
    /// CAPTCHA verification failed or could not be confirmed.
    Unauthorized(String),
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Error interacting with an external API (Turnstile, Klaviyo).
    ExternalApiError(String),
    /// Internal server error. The message is shown to the client.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Machine-readable kind returned to the client.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "BAD_REQUEST",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::ExternalApiError(_) => "BAD_GATEWAY",
            AppError::DatabaseError(_) | AppError::InternalError(_) => "INTERNAL_SERVER_ERROR",
            AppError::WithContext { source, .. } => source.code(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status code and a JSON body of the
    /// form `{"success": false, "code": ..., "error": ...}`.
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, body) = match self {
            AppError::Validation(e) => {
                tracing::debug!("Rejected lead form: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "success": false,
                        "code": code,
                        "error": e.issues.first().map(|i| i.message).unwrap_or("Invalid input"),
                        "fields": e.issues,
                    }),
                )
            }
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized submission: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    json!({ "success": false, "code": code, "error": msg }),
                )
            }
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "code": code, "error": "Database error" }),
                )
            }
            AppError::ExternalApiError(msg) => {
                tracing::error!("External API error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "success": false, "code": code, "error": "External service error" }),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "code": code, "error": msg }),
                )
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return (*source).into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }
}
