use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid phone number format: {0}")]
    InvalidPhoneFormat(String),

    #[error("Already subscribed to these categories")]
    AlreadySubscribed,

    #[error("Invalid or expired verification code")]
    InvalidCode,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("SMS gateway error: {0}")]
    Gateway(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidPhoneFormat(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_PHONE_FORMAT", msg.clone())
            }
            AppError::AlreadySubscribed => (
                StatusCode::BAD_REQUEST,
                "ALREADY_SUBSCRIBED",
                "Already subscribed to these categories.".to_string(),
            ),
            // Same message for wrong, expired, and nonexistent codes so the
            // response does not leak which condition failed.
            AppError::InvalidCode => (
                StatusCode::BAD_REQUEST,
                "INVALID_CODE",
                "Invalid or expired verification code.".to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Gateway(msg) => {
                tracing::error!("SMS gateway error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GATEWAY_ERROR",
                    "Failed to deliver SMS through the gateway".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
