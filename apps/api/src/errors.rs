use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::catalog::LoadError;
use crate::embedding::EmbeddingError;
use crate::matching::factors::AggregationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Catalog or policy data could not be loaded: {0}")]
    LoadFailure(#[from] LoadError),

    #[error("Query has {tokens} words; at least {required} are needed")]
    InsufficientQuery { tokens: usize, required: usize },

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("No job profiles in family {family:?} / subfamily {subfamily:?}")]
    NoCandidates {
        family: Option<String>,
        subfamily: Option<String>,
    },

    #[error("The job catalog is empty")]
    EmptyCatalog,

    #[error("Grade factor aggregation failed: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the caller may simply retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Embedding(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::LoadFailure(e) => {
                tracing::error!("Load failure: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LOAD_FAILURE",
                    self.to_string(),
                )
            }
            AppError::InsufficientQuery { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INSUFFICIENT_QUERY",
                format!("{self}. Describe your daily activities in more detail."),
            ),
            AppError::Embedding(e) => {
                tracing::error!("Embedding error: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "EMBEDDING_FAILURE",
                    "The similarity model is unavailable; please retry".to_string(),
                )
            }
            AppError::NoCandidates { .. } => {
                (StatusCode::NOT_FOUND, "NO_CANDIDATES", self.to_string())
            }
            AppError::EmptyCatalog => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CATALOG_EMPTY",
                self.to_string(),
            ),
            AppError::Aggregation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "AGGREGATION_ERROR",
                e.to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
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
                "message": message,
                "retryable": self.is_retryable(),
            }
        }));

        (status, body).into_response()
    }
}
