#![forbid(unsafe_code)]

use crate::blob::BlobError;
use crate::pipeline::PipelineError;
use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use it_core::IdError;
use it_storage::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("Access denied")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Record file not found".to_string()),
            StoreError::UnknownRecord => ApiError::NotFound("Record not found".to_string()),
            StoreError::UnknownAccount => ApiError::NotFound("User not found".to_string()),
            StoreError::OrdinalOutOfRange { .. } => ApiError::NotFound(err.to_string()),
            StoreError::InvalidInput(message) => ApiError::BadRequest(message.to_string()),
            StoreError::Record(err) => ApiError::BadRequest(err.to_string()),
            StoreError::AccountExists => ApiError::BadRequest("User already exists".to_string()),
            other => internal("store", &other),
        }
    }
}

impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotFound => ApiError::NotFound("File not found".to_string()),
            BlobError::InvalidRef(_) => ApiError::BadRequest(err.to_string()),
            other => internal("blob storage", &other),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(message) => ApiError::BadRequest(message.to_string()),
            PipelineError::MissingFolder => ApiError::BadRequest(err.to_string()),
            PipelineError::Username(err) => ApiError::BadRequest(err.to_string()),
            PipelineError::Store(err) => err.into(),
            PipelineError::Blob(err) => err.into(),
            other => internal("document pipeline", &other),
        }
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        ApiError::BadRequest(format!("invalid username: {err}"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(err: PathRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(err: MultipartRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        internal("blocking task", &err)
    }
}

/// Logs the detail and keeps only the top-level message for the client.
fn internal(component: &'static str, err: &dyn std::error::Error) -> ApiError {
    error!(component, error = %err, "request failed");
    ApiError::Internal(format!("{component} error"))
}
