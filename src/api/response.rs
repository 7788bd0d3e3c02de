//! JSON response envelope.
//!
//! Successes are written as `{"result": ...}`, failures as `{"error": "..."}`.
//! Both go through `axum::Json`, so `Content-Type: application/json` is
//! always set.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::CalendarError;

#[derive(Debug, Serialize)]
struct ResultBody<T> {
    result: T,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Successful response carrying `T` under `result`.
#[derive(Debug)]
pub struct ApiResponse<T>(pub T);

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(ResultBody { result: self.0 })).into_response()
    }
}

/// Failed response with a status code and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
    }

    pub fn request_timeout() -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, "request timed out")
    }
}

impl From<CalendarError> for ApiError {
    fn from(err: CalendarError) -> Self {
        let status = match &err {
            CalendarError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            // Business-rule conflicts are reported as retryable.
            CalendarError::Duplicate => StatusCode::SERVICE_UNAVAILABLE,
            e if e.is_not_found() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: &self.message,
            }),
        )
            .into_response()
    }
}
