//! Error envelope responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rainwatch_core::{error_envelope, AuthError, TorrentClientError, TransferError};

/// An error answered as `{"status": "error", "error": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
        }
    }

    pub fn json_required() -> Self {
        Self::new(
            StatusCode::EXPECTATION_FAILED,
            "json_required",
            "Content-Type must be application/json",
        )
    }

    pub fn invalid_json(detail: impl std::fmt::Display) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "invalid_json",
            format!("Request body is not valid JSON: {}", detail),
        )
    }

    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "invalid_params",
            format!("Invalid request parameters: {}", detail),
        )
    }

    pub fn missing_params(name: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "missing_params",
            format!("Required parameter '{}' is missing from request", name),
        )
    }

    pub fn backend_unavailable() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "backend_unavailable",
            "Torrent client not configured",
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let (status, message) = match &err {
            AuthError::NotAuthenticated => (StatusCode::BAD_REQUEST, err.to_string()),
            AuthError::InvalidCredentials(_) => {
                (StatusCode::UNAUTHORIZED, "Authentication failed".to_string())
            }
            AuthError::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };
        Self::new(status, err.code(), message)
    }
}

impl From<TorrentClientError> for ApiError {
    fn from(err: TorrentClientError) -> Self {
        match err {
            TorrentClientError::TorrentNotFound(id) => Self::new(
                StatusCode::NOT_FOUND,
                "torrent_not_found",
                format!("Torrent not found: {}", id),
            ),
            other => Self::new(StatusCode::BAD_GATEWAY, "backend_error", other.to_string()),
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::InvalidOptions(detail) => Self::invalid_params(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(error_envelope(self.error, &self.message))).into_response()
    }
}
