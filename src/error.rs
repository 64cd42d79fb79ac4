//! Application error types and HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error model used throughout request parsing, validation, correction, and
/// generation.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{message}")]
    InvalidRequest {
        message: String,
        param: Option<String>,
        code: Option<String>,
        status: StatusCode,
    },
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("{0}")]
    BadMultipart(String),
    #[error("{0}")]
    InvalidTrack(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Creates a `401 Unauthorized` error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates an `invalid_request_error` payload with status `400`.
    pub fn invalid_request(
        message: impl Into<String>,
        param: Option<&str>,
        code: Option<&str>,
    ) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            param: param.map(ToOwned::to_owned),
            code: code.map(ToOwned::to_owned),
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// Creates a `415 Unsupported Media Type` style error.
    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::UnsupportedMediaType(message.into())
    }

    /// Creates a multipart parsing/shape validation error.
    pub fn bad_multipart(message: impl Into<String>) -> Self {
        Self::BadMultipart(message.into())
    }

    /// Creates a track-data validation error (boundary rejection).
    pub fn invalid_track(message: impl Into<String>) -> Self {
        Self::InvalidTrack(message.into())
    }

    /// Creates a `404 Not Found` error for a missing track pair.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Creates a `502` error for generation-service failures.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Creates a `503` error for an unconfigured or unready generator.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a generic internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

fn payload(
    message: String,
    error_type: &str,
    param: Option<&str>,
    code: Option<&str>,
) -> ErrorPayload {
    ErrorPayload {
        error: ErrorBody {
            message,
            error_type: error_type.to_string(),
            param: param.map(ToOwned::to_owned),
            code: code.map(ToOwned::to_owned),
        },
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, payload) = match self {
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                payload(
                    message,
                    "authentication_error",
                    None,
                    Some("invalid_api_key"),
                ),
            ),
            AppError::InvalidRequest {
                message,
                param,
                code,
                status,
            } => (
                status,
                ErrorPayload {
                    error: ErrorBody {
                        message,
                        error_type: "invalid_request_error".to_string(),
                        param,
                        code,
                    },
                },
            ),
            AppError::UnsupportedMediaType(message) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                payload(
                    message,
                    "invalid_request_error",
                    Some("file"),
                    Some("unsupported_media_type"),
                ),
            ),
            AppError::BadMultipart(message) => (
                StatusCode::BAD_REQUEST,
                payload(
                    message,
                    "invalid_request_error",
                    Some("file"),
                    Some("invalid_multipart"),
                ),
            ),
            AppError::InvalidTrack(message) => (
                StatusCode::BAD_REQUEST,
                payload(
                    message,
                    "invalid_request_error",
                    Some("track"),
                    Some("invalid_track"),
                ),
            ),
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                payload(message, "invalid_request_error", None, Some("not_found")),
            ),
            AppError::Upstream(message) => (
                StatusCode::BAD_GATEWAY,
                payload(message, "server_error", None, Some("generation_failed")),
            ),
            AppError::Unavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                payload(message, "server_error", None, Some("generator_unavailable")),
            ),
            AppError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                payload(message, "server_error", None, Some("internal_error")),
            ),
        };

        (status, Json(payload)).into_response()
    }
}
