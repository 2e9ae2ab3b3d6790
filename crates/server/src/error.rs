//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gagyebu_ocr::{ErrorKind, ProcessError};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Receipt not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upload exceeds the {0}-byte limit")]
    PayloadTooLarge(usize),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

fn process_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound | ErrorKind::FileNotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyProcessed | ErrorKind::UnsupportedFormat | ErrorKind::InvalidPath => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::OcrEngineFailure | ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Process(e) => process_status(e.kind()),
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Database(_) | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Process(e) => e.kind().as_str(),
            ApiError::Unauthorized => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::Database(_) => "database_error",
            ApiError::Io(_) => "io_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Database(e) => {
                tracing::error!("Database error: {e}");
                "Database error".to_string()
            }
            ApiError::Io(e) => {
                tracing::error!("IO error: {e}");
                "IO error".to_string()
            }
            ApiError::Process(e @ ProcessError::Store(_)) => {
                tracing::error!("{e}");
                "Storage error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse { error: self.code(), message });
        (status, body).into_response()
    }
}
