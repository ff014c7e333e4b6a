use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::clients::LiveError;
use crate::services::LifecycleError;

/// API failure carrying a stable error code. Internal detail is logged,
/// never surfaced in the response body.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),

    Unauthorized,

    NotFound(&'static str),

    Upstream(String),

    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::NotFound(code) => write!(f, "Not found: {}", code),
            ApiError::Upstream(code) => write!(f, "Upstream failure: {}", code),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            ApiError::Validation(msg) => {
                tracing::debug!("Validation failure: {}", msg);
                (StatusCode::BAD_REQUEST, "VALIDATION".to_string())
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED".to_string()),
            ApiError::NotFound(code) => (StatusCode::NOT_FOUND, code.to_string()),
            ApiError::Upstream(code) => (StatusCode::BAD_GATEWAY, code),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL".to_string())
            }
        };

        let body = ApiResponse::<()>::error(code);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::RequestNotFound => ApiError::NotFound("REQUEST_NOT_FOUND"),
            LifecycleError::FlatNotFound => ApiError::NotFound("FLAT_NOT_FOUND"),
            LifecycleError::Validation(msg) => ApiError::Validation(msg),
            LifecycleError::Database(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<LiveError> for ApiError {
    fn from(err: LiveError) -> Self {
        match err {
            LiveError::BadSnapshot { status, excerpt } => {
                tracing::warn!(
                    "Live routing returned a non-JSON snapshot (status {}): {}",
                    status,
                    excerpt
                );
                ApiError::Upstream("BAD_SNAPSHOT_RESPONSE".to_string())
            }
            LiveError::Declined(code) => ApiError::Upstream(code),
            LiveError::Transport(e) => {
                tracing::warn!("Live routing unreachable: {}", e);
                ApiError::Upstream("UPSTREAM_FAILURE".to_string())
            }
        }
    }
}
