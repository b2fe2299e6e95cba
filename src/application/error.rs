//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{JobServiceError, ObjectStoreError};
use crate::domain::transcription::TranscriptionError;
use crate::domain::upload::UploadError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 配置缺失（凭据、endpoint），启动阶段即失败
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid part number: must be in [0, {limit}), got {value}")]
    InvalidPartNumber { value: i64, limit: u32 },

    /// 签名凭据不可用
    #[error("Credential error: {0}")]
    CredentialError(String),

    /// 资源未找到
    #[error("Not found: {0}")]
    NotFound(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 分片缺失（升序扫描到的第一个）
    #[error("part {0} not found")]
    PartMissing(u32),

    #[error("Compose error: {0}")]
    ComposeError(String),

    #[error("empty status received")]
    EmptyStatus,

    #[error("unexpected status received: {0}")]
    UnexpectedStatus(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    /// 远端违反协议（不自动重试）
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyStatus | Self::UnexpectedStatus(_) | Self::DecodeError(_)
        )
    }

    /// 调用方可以原样重试整个操作
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StorageError(_) | Self::ComposeError(_) | Self::ExternalServiceError(_)
        )
    }
}

impl From<UploadError> for ApplicationError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidPartNumber { value, limit } => {
                Self::InvalidPartNumber { value, limit }
            }
            other => Self::ValidationError(other.to_string()),
        }
    }
}

impl From<ObjectStoreError> for ApplicationError {
    fn from(err: ObjectStoreError) -> Self {
        match err {
            ObjectStoreError::Credential(msg) => Self::CredentialError(msg),
            ObjectStoreError::NotFound(key) => Self::NotFound(format!("object {}", key)),
            ObjectStoreError::Storage(msg) => Self::StorageError(msg),
            ObjectStoreError::Compose(msg) => Self::ComposeError(msg),
            ObjectStoreError::InvalidKey(msg) => Self::ValidationError(msg),
        }
    }
}

impl From<JobServiceError> for ApplicationError {
    fn from(err: JobServiceError) -> Self {
        match err {
            JobServiceError::Configuration(msg) => Self::ConfigurationError(msg),
            JobServiceError::InvalidRequest(msg) => Self::ValidationError(msg),
            JobServiceError::ServiceError { status: 404, body } => {
                Self::NotFound(format!("job: {}", body))
            }
            JobServiceError::NetworkError(_)
            | JobServiceError::Timeout
            | JobServiceError::ServiceError { .. } => Self::ExternalServiceError(err.to_string()),
            JobServiceError::InvalidResponse(msg) => Self::DecodeError(msg),
            JobServiceError::EmptyStatus => Self::EmptyStatus,
            JobServiceError::UnexpectedStatus(value) => Self::UnexpectedStatus(value),
        }
    }
}

impl From<TranscriptionError> for ApplicationError {
    fn from(err: TranscriptionError) -> Self {
        match err {
            TranscriptionError::EmptyStatus => Self::EmptyStatus,
            TranscriptionError::UnexpectedStatus(value) => Self::UnexpectedStatus(value),
            TranscriptionError::Decode(msg) => Self::DecodeError(msg),
        }
    }
}
