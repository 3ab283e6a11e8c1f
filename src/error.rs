// =============================================================================
// Green City Backend - Error Types
// =============================================================================

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application error type.
///
/// One variant per failure category so handlers and tests can match on the
/// kind instead of parsing message text. Token failures are deliberately
/// coarse: a malformed token and an expired token produce the same response.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Token is missing")]
    MissingToken,

    #[error("Token is invalid")]
    InvalidToken,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password".into())
            }
            AppError::MissingToken => (StatusCode::UNAUTHORIZED, "Token is missing".into()),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "Token is invalid".into()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions".into()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".into())
            }
            AppError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
