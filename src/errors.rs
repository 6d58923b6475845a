use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::validation::FieldErrors;

/// Error body returned for every rejected request.
///
/// `code` is machine-readable and stable; `message` is for humans. Internal
/// failure detail never reaches this structure.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Stable machine-readable error code (e.g. "VALIDATION_FAILED")
    #[schema(example = "VALIDATION_FAILED")]
    pub code: String,
    /// Human-readable error description
    #[schema(example = "One or more fields failed validation")]
    pub message: String,
    /// Per-field validation messages, present only for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
    /// Milliseconds until the rate-limit window resets, for 429 responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    /// Id of the request that produced the error, for log correlation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    #[schema(example = "2026-08-04T10:30:00.000Z")]
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Not found")]
    NotFound,

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after_ms: u64 },

    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Unauthorized => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::ExternalService(_) => "UPSTREAM_ERROR",
        }
    }

    /// Message suitable for response bodies. Internal errors return a
    /// generic message so implementation detail never leaks.
    pub fn response_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::ExternalService(_) => "Upstream service unavailable".to_string(),
            Self::NotFound => "Resource not found".to_string(),
            Self::Validation(_) => "One or more fields failed validation".to_string(),
            Self::RateLimited { .. } => "Too many requests, slow down".to_string(),
            Self::Unauthorized => "Authentication required".to_string(),
            Self::Forbidden => "You do not have access to this resource".to_string(),
            Self::Conflict(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let (field_errors, retry_after_ms) = match &self {
            Self::Validation(errors) => (Some(errors.clone()), None),
            Self::RateLimited { retry_after_ms } => (None, Some(*retry_after_ms)),
            _ => (None, None),
        };

        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.response_message(),
            field_errors,
            retry_after_ms,
            request_id: crate::request_id::current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let mut response = (status, Json(body)).into_response();

        if let Some(ms) = retry_after_ms {
            let secs = ms.div_ceil(1000);
            if let Ok(value) = http::HeaderValue::from_str(&secs.to_string()) {
                response
                    .headers_mut()
                    .insert(http::header::RETRY_AFTER, value);
            }
        }

        response
    }
}
