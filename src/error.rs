use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Every requested category failed to load from the place catalog.
    #[error("Place catalog unreachable: {0}")]
    Connectivity(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Weather service error: {0}")]
    Weather(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Route generation cancelled")]
    Cancelled,

    #[error("Route generation timed out after {0}s")]
    Timeout(u64),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the caller may reasonably retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Connectivity(_)
                | AppError::Database(_)
                | AppError::Persistence(_)
                | AppError::Timeout(_)
        )
    }
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = self.is_retryable();
        let (status, error_message) = match self {
            AppError::InvalidRequest(ref e) => (StatusCode::BAD_REQUEST, e.clone()),
            AppError::Connectivity(ref e) => {
                tracing::warn!("Place catalog unreachable: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Cannot reach the place catalog, check your connection and retry".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal database error".to_string(),
                )
            }
            AppError::Persistence(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not store the route".to_string(),
                )
            }
            AppError::Cache(ref e) => {
                tracing::warn!("Cache error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Cache error".to_string())
            }
            AppError::Weather(ref e) => {
                tracing::warn!("Weather service error: {}", e);
                (StatusCode::BAD_GATEWAY, "Weather service error".to_string())
            }
            AppError::NotFound(ref e) => (StatusCode::NOT_FOUND, e.clone()),
            AppError::Cancelled => (
                StatusCode::REQUEST_TIMEOUT,
                "Route generation cancelled".to_string(),
            ),
            AppError::Timeout(secs) => {
                tracing::warn!("Route generation timed out after {}s", secs);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Route generation is taking longer than expected".to_string(),
                )
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": error_message,
            "retryable": retryable,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
