use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::round::InvalidTransition};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Submitted question or answer does not have an acceptable shape.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// No round is running, or the answer targets a question that is not the current one.
    #[error("no active round for this question")]
    NoActiveRound,
    /// Answer index is outside `1..=count`.
    #[error("invalid answer index: there are {count} possible answers")]
    InvalidAnswerIndex {
        /// Number of answers the current question offers.
        count: usize,
    },
    /// Rotation found no dormant question to activate.
    #[error("no question available")]
    NoQuestionAvailable,
    /// Storage backend failed or rejected the operation.
    #[error("storage failure")]
    Storage(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
    /// Round state changed in a way the lifecycle does not allow.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Storage(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => AppError::BadRequest(message),
            ServiceError::InvalidAnswerIndex { .. } => AppError::BadRequest(err.to_string()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::NoActiveRound | ServiceError::NoQuestionAvailable => {
                AppError::Conflict(err.to_string())
            }
            ServiceError::Storage(StorageError::Conflict { message }) => AppError::Conflict(message),
            ServiceError::Storage(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Timeout => AppError::ServiceUnavailable("operation timed out".into()),
            ServiceError::InvalidTransition(invalid) => AppError::Internal(invalid.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
