//! API error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

/// Machine-readable error codes exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    InvalidInput,
    Unauthorized,
    Forbidden,
    NotFound,
    StorageFailed,
}

impl ApiErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::StorageFailed => "storage_failed",
        }
    }

    fn status(self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            // Storage is an upstream dependency of every handler.
            Self::StorageFailed => StatusCode::FAILED_DEPENDENCY,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(what: &str, id: &str) -> Self {
        Self::new(ApiErrorCode::NotFound, format!("{what} with id {id} not found"))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Forbidden, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Unauthorized, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidInput, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = Json(json!({
            "error": self.code.as_str(),
            "message": self.message,
        }));
        (status, body).into_response()
    }
}

/// Logs a storage failure and converts it to the client-facing error.
pub fn db_error(context: &str, error: mongodb::error::Error) -> ApiError {
    error!(error = ?error, "{context} failed");
    ApiError::new(ApiErrorCode::StorageFailed, format!("{context} failed"))
}

/// `Option -> Result` with a uniform 404.
pub trait OptionNotFoundExt<T> {
    fn or_not_found(self, what: &str, id: &str) -> Result<T, ApiError>;
}

impl<T> OptionNotFoundExt<T> for Option<T> {
    fn or_not_found(self, what: &str, id: &str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(what, id))
    }
}
