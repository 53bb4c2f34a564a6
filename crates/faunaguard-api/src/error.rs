use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use faunaguard_core::RegistryError;
use serde_json::json;
use thiserror::Error;

/// Request rejections. Every variant renders as `{"status": "error", "message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Unauthorized => ApiError::Unauthorized(err.to_string()),
            RegistryError::MissingCameraId | RegistryError::MissingDeviceToken => {
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        tracing::warn!(status = %status, message = %message, "request rejected");

        let body = Json(json!({
            "status": "error",
            "message": message,
        }));
        (status, body).into_response()
    }
}
