use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::models::file::ParseFileTypeError;
use crate::stores::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<ParseFileTypeError> for AppError {
    fn from(e: ParseFileTypeError) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Logs a collaborator failure with context and hands it back unchanged.
pub fn handle_store_error(error: StoreError, context: &str) -> AppError {
    tracing::error!(error = %error, "{}", context);
    AppError::Store(error)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".into()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            AppError::Store(e) => {
                let status = match e {
                    StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    StoreError::UnknownAttribute(_) | StoreError::InvalidQuery(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    StoreError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
                    StoreError::Conflict(_) => StatusCode::CONFLICT,
                    StoreError::Unavailable(_) => StatusCode::BAD_GATEWAY,
                };
                (status, e.to_string())
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Anyhow(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %message);
        } else {
            tracing::debug!(status = %status, error = %message);
        }

        let body = json!({
            "data": null,
            "error": {
                "code": status.as_u16(),
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
