use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use eclipse_db::StoreError;
use eclipse_media::MediaError;

/// Handler error taxonomy. Every variant is recovered at the handler
/// boundary and rendered as an HTTP status plus `{"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Unknown action")]
    UnknownAction,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            // The API surface uses 400 for conflicts as well as bad input.
            ApiError::Validation(_) | ApiError::UnknownAction | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Forbidden(msg) => ApiError::Forbidden(msg),
            StoreError::Sqlite(e) => {
                error!("sqlite error: {e}");
                ApiError::Internal
            }
            StoreError::Lock(e) => {
                error!("db lock error: {e}");
                ApiError::Internal
            }
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Io(e) => {
                error!("media storage error: {e}");
                ApiError::Internal
            }
            other => ApiError::Validation(other.to_string()),
        }
    }
}
