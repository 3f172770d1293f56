//! Uniform JSON error envelope for the gateway

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::ShopError;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'a str,
}

/// An error as the client sees it: status, stable code and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_INPUT", message)
    }

    pub fn timeout() -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", "request deadline exceeded")
    }
}

impl From<ShopError> for ApiError {
    fn from(e: ShopError) -> Self {
        let status = match &e {
            ShopError::InvalidOrder(_)
            | ShopError::ActorUnknown(_)
            | ShopError::ProductUnknown(_)
            | ShopError::InsufficientStock { .. }
            | ShopError::BadTransition { .. }
            | ShopError::InvalidInput(_)
            | ShopError::InvalidPhone
            | ShopError::InvalidAddress
            | ShopError::EmailTaken(_) => StatusCode::BAD_REQUEST,
            ShopError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ShopError::NotFound { .. } => StatusCode::NOT_FOUND,
            ShopError::StoreUnavailable(_) | ShopError::UpstreamUnavailable(_) | ShopError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(code = e.kind(), error = %e, "request failed");
            let message = match e {
                ShopError::Internal(_) => "internal error",
                _ => "service temporarily unavailable",
            };
            return Self::new(status, e.kind(), message);
        }
        Self::new(status, e.kind(), e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_input(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_input(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: &self.message, code: self.code };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
