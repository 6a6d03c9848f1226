//! Application error mapping.
//!
//! Maps the workspace error taxonomy to HTTP responses with stable kinds
//! and human-readable reasons. Storage failures are logged with their
//! detail and leave the process as a generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use snag_core::Error;

/// HTTP-facing wrapper around the workspace error taxonomy.
#[derive(Debug)]
pub struct AppError(pub Error);

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self.0 {
            Error::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                self.0.kind(),
                self.0.to_string(),
            ),
            Error::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.0.kind(), self.0.to_string()),
            Error::Forbidden(_) => (StatusCode::FORBIDDEN, self.0.kind(), self.0.to_string()),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, self.0.kind(), self.0.to_string()),
            Error::InvalidTransition { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                self.0.kind(),
                self.0.to_string(),
            ),
            Error::Conflict(_) => (StatusCode::CONFLICT, self.0.kind(), self.0.to_string()),
            Error::Storage(detail) => {
                tracing::error!(error = %detail, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    self.0.kind(),
                    "internal error".to_string(),
                )
            }
        };
        let body = serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "kind": kind,
                "message": message,
            }
        });
        (status, axum::Json(body)).into_response()
    }
}
