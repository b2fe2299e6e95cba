//! HTTP Error Handling
//!
//! JSON 接口的错误一律返回 HTTP 200，错误码放在 `errno` 中

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const FORBIDDEN: i32 = 403;
    pub const NOT_FOUND: i32 = 404;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const BAD_GATEWAY: i32 = 502;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Internal(String),
    /// 远端服务违反协议
    BadGateway(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn errno(&self) -> i32 {
        match self {
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::Forbidden(_) => errno::FORBIDDEN,
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
            ApiError::BadGateway(_) => errno::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        let msg = self.message();
        match &self {
            ApiError::BadRequest(_) => tracing::warn!(errno, error = %msg, "Bad request"),
            ApiError::Forbidden(_) => tracing::warn!(errno, error = %msg, "Forbidden"),
            ApiError::NotFound(_) => tracing::warn!(errno, error = %msg, "Resource not found"),
            ApiError::Internal(_) => tracing::error!(errno, error = %msg, "Internal server error"),
            ApiError::BadGateway(_) => {
                tracing::error!(errno, error = %msg, "Upstream protocol violation")
            }
            ApiError::ServiceUnavailable(_) => {
                tracing::error!(errno, error = %msg, "Service unavailable")
            }
        }

        (StatusCode::OK, Json(ErrorResponse::new(errno, msg))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        let msg = e.to_string();
        match e {
            ApplicationError::ValidationError(_)
            | ApplicationError::InvalidPartNumber { .. }
            | ApplicationError::PartMissing(_) => ApiError::BadRequest(msg),
            ApplicationError::NotFound(_) => ApiError::NotFound(msg),
            ApplicationError::StorageError(_)
            | ApplicationError::ComposeError(_)
            | ApplicationError::InternalError(_) => ApiError::Internal(msg),
            ApplicationError::EmptyStatus
            | ApplicationError::UnexpectedStatus(_)
            | ApplicationError::DecodeError(_) => ApiError::BadGateway(msg),
            ApplicationError::ConfigurationError(_)
            | ApplicationError::CredentialError(_)
            | ApplicationError::ExternalServiceError(_) => ApiError::ServiceUnavailable(msg),
        }
    }
}
