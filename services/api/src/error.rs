use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use worklog_common::WorklogError;

/// JSON error response. Default status per error variant; handlers that
/// need a phase-specific status construct it with [`ApiError::new`].
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<WorklogError> for ApiError {
    fn from(err: WorklogError) -> Self {
        let status = match &err {
            WorklogError::Validation(_) => StatusCode::BAD_REQUEST,
            WorklogError::Authentication(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
