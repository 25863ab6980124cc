//! API error types and conversions

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use zeeho_coordinator::{FailureKind, RefreshError, UnlockError};
use zeeho_core::UnknownFieldError;

/// API error type that converts to HTTP responses
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),
    /// 403 Forbidden (upstream refused a command)
    Forbidden(String),
    /// 404 Not Found
    NotFound(String),
    /// 500 Internal Server Error (local misconfiguration)
    Misconfigured(String),
    /// 502 Bad Gateway
    BadGateway(String),
    /// 502 Bad Gateway, upstream no longer accepts the credentials
    UpstreamUnauthorized(String),
    /// 503 Service Unavailable
    ServiceUnavailable(String),
    /// 504 Gateway Timeout
    GatewayTimeout(String),
}

/// Standard error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "command_rejected", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Misconfigured(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "misconfigured", msg)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
            ApiError::UpstreamUnauthorized(msg) => {
                (StatusCode::BAD_GATEWAY, "upstream_unauthorized", msg)
            }
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
            ApiError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "gateway_timeout", msg),
        };

        if status.is_server_error() {
            tracing::error!(error = error_type, %message, "API error");
        } else {
            tracing::debug!(error = error_type, %message, "API client error");
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        let message = err.to_string();
        match (&err, err.kind()) {
            (RefreshError::Timeout(_), _) => ApiError::GatewayTimeout(message),
            (_, FailureKind::Reauthenticate) => ApiError::UpstreamUnauthorized(message),
            (_, FailureKind::Misconfiguration) => ApiError::Misconfigured(message),
            (_, FailureKind::Transient) => ApiError::BadGateway(message),
        }
    }
}

impl From<UnlockError> for ApiError {
    fn from(err: UnlockError) -> Self {
        let message = err.to_string();
        match err {
            UnlockError::Client(_) => ApiError::BadGateway(message),
            UnlockError::Timeout(_) => ApiError::GatewayTimeout(message),
            UnlockError::CommandRejected { .. } => ApiError::Forbidden(message),
            UnlockError::MissingSecret => ApiError::BadRequest(message),
        }
    }
}

impl From<UnknownFieldError> for ApiError {
    fn from(err: UnknownFieldError) -> Self {
        ApiError::NotFound(err.to_string())
    }
}
