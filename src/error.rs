//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::ml::{DatasetError, ModelError};
use crate::services::refresh::RefreshError;
use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Auth errors
    MalformedIdentification,
    InvalidCredentials,
    Forbidden,

    // Storage errors
    StoreError(String),
    DatasetError(String),
    ModelError(String),

    // External service errors
    ExternalServiceError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MalformedIdentification => (
                StatusCode::BAD_REQUEST,
                "Identification header must be formatted as username:password",
            ),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid username or password"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Administrator rights required"),
            AppError::StoreError(msg) => {
                tracing::error!("Credential store error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Credential store error occurred")
            }
            AppError::DatasetError(msg) => {
                tracing::error!("Dataset error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Dataset could not be loaded")
            }
            AppError::ModelError(msg) => {
                tracing::error!("Model error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Model error occurred")
            }
            AppError::ExternalServiceError(msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Data refresh failed")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::StoreError(err.to_string())
    }
}

impl From<DatasetError> for AppError {
    fn from(err: DatasetError) -> Self {
        AppError::DatasetError(err.to_string())
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Dataset(inner) => AppError::DatasetError(inner.to_string()),
            ModelError::EmptyTrainingSet
            | ModelError::EmptyTestSet
            | ModelError::LengthMismatch { .. } => AppError::DatasetError(err.to_string()),
            other => AppError::ModelError(other.to_string()),
        }
    }
}

impl From<RefreshError> for AppError {
    fn from(err: RefreshError) -> Self {
        AppError::ExternalServiceError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(err.to_string())
    }
}
