pub mod config;
pub mod health;
pub mod index;
pub mod run;

// Common response types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error response for the rare fatal paths (template render failure,
/// store or log I/O failure)
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub trace_id: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        tracing::error!(
            error = %self.error,
            message = %self.message,
            trace_id = %self.trace_id,
            "Request failed"
        );
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}
