//! Maps [`AppError`] onto the HTTP error body shape (spec.md §6):
//! `{status, message, description:[...]}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use filepoint_core::{AppError, ErrorMetadata};
use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    pub description: Vec<String>,
}

/// Wraps [`AppError`] for `IntoResponse`; handlers return `Result<_, HttpAppError>`.
pub struct HttpAppError(pub AppError, pub Vec<String>);

impl HttpAppError {
    pub fn with_description(err: AppError, description: Vec<String>) -> Self {
        Self(err, description)
    }
}

impl<E: Into<AppError>> From<E> for HttpAppError {
    fn from(err: E) -> Self {
        Self(err.into(), Vec::new())
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let HttpAppError(err, mut description) = self;
        let status = StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match err.log_level() {
            filepoint_core::LogLevel::Debug => tracing::debug!(error = %err, "request failed"),
            filepoint_core::LogLevel::Warn => tracing::warn!(error = %err, "request failed"),
            filepoint_core::LogLevel::Error => tracing::error!(error = %err, "request failed"),
        }

        if description.is_empty() {
            description.push(err.client_message());
        }

        let body = ErrorResponse {
            status: status.as_u16(),
            message: err.client_message(),
            description,
        };

        (status, Json(body)).into_response()
    }
}
