//! Wraps [`tasklist_core::CoreError`] for the HTTP layer, since the orphan
//! rule forbids implementing `IntoResponse` directly on a foreign type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use tasklist_core::error::{CoreError, ErrorMetadata, LogLevel};

pub struct HttpCoreError(pub CoreError);

impl From<CoreError> for HttpCoreError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
    recoverable: bool,
}

impl IntoResponse for HttpCoreError {
    fn into_response(self) -> Response {
        let err = &self.0;
        match err.log_level() {
            LogLevel::Error => tracing::error!(error = %err, "request failed"),
            LogLevel::Warn => tracing::warn!(error = %err, "request failed"),
            LogLevel::Debug => tracing::debug!(error = %err, "request failed"),
        }

        let status =
            StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            error: err.to_string(),
            code: err.error_code(),
            recoverable: err.is_recoverable(),
        };
        (status, Json(body)).into_response()
    }
}
