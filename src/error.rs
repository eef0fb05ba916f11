use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by HTTP handlers.
///
/// Storage and upstream failures are logged with full detail but rendered
/// with a fixed message so internals never reach the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed on `{field}`: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation { field, message } => {
                tracing::debug!(field, %message, "validation error");
                json!({ "error": message, "field": field })
            }
            AppError::Unauthorized => {
                tracing::debug!("unauthenticated request");
                json!({ "error": "Unauthorized" })
            }
            AppError::InvalidCredentials => json!({ "error": "Invalid credentials" }),
            AppError::Conflict(msg) => {
                tracing::warn!(%msg, "conflict");
                json!({ "error": msg })
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                json!({ "error": "Internal Server Error" })
            }
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "upstream error");
                json!({ "error": "Failed to fetch catalog data" })
            }
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                json!({ "error": "Internal Server Error" })
            }
        };
        (status, Json(body)).into_response()
    }
}
