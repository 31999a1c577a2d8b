//! HTTP error responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use intake_storage::{ErrorDetails, StorageError};
use serde::Serialize;

/// Message returned to clients when a durable write fails.
pub const STORAGE_FAILURE_MESSAGE: &str = "Failed to save patient data";

/// Message returned to clients when a search cannot be served.
pub const SEARCH_FAILURE_MESSAGE: &str = "Failed to search patients";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    Storage {
        message: &'static str,
        details: ErrorDetails,
    },
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a ErrorDetails>,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Translate a storage failure, keeping the diagnostic triple for the body.
    pub fn from_storage(err: &StorageError, message: &'static str) -> Self {
        if err.is_client_error() {
            return Self::BadRequest(err.to_string());
        }
        Self::Storage {
            message,
            details: err.details(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::BadRequest(msg) => ErrorBody {
                error: msg,
                details: None,
            },
            Self::Storage { message, details } => ErrorBody {
                error: message,
                details: Some(details),
            },
        };
        (status, Json(body)).into_response()
    }
}
