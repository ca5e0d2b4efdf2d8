//! Request-path errors and their HTTP representation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::drive::DriveError;
use crate::repository::{CatalogError, HistoryError};

/// Every failure an API handler can report.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),
    /// The file name's identifier is not in the catalog.
    #[error("{0}")]
    NotFound(String),
    /// Missing or invalid bearer token.
    #[error("{0}")]
    Auth(String),
    /// The destination object already exists.
    #[error("{0}")]
    Conflict(String),
    /// Remote or local storage failure.
    #[error("{message}: {details}")]
    Storage { message: String, details: String },
}

impl AppError {
    pub fn storage(message: impl Into<String>, details: impl ToString) -> Self {
        AppError::Storage {
            message: message.into(),
            details: details.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Storage { message, details } => json!({ "error": message, "details": details }),
            AppError::Validation(message)
            | AppError::NotFound(message)
            | AppError::Auth(message)
            | AppError::Conflict(message) => json!({ "error": message }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        AppError::storage("Failed to access upload history", err)
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::storage("Failed to read the game catalog", err)
    }
}

impl From<DriveError> for AppError {
    fn from(err: DriveError) -> Self {
        match err {
            DriveError::Unauthorized(msg) => AppError::Auth(format!("Google Drive rejected the token: {}", msg)),
            other => AppError::storage("Google Drive request failed", other),
        }
    }
}
