//! Job Service Port - 远程推理任务服务抽象
//!
//! 异步任务生命周期：提交 → 轮询状态 → 获取结果。
//! 具体实现在 infrastructure/adapters/runpod 层

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::transcription::{JobStatus, TranscriptionError};

/// Job Service 错误
#[derive(Debug, Error)]
pub enum JobServiceError {
    /// 缺少 endpoint / API key 等配置
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: HTTP {status}: {body}")]
    ServiceError { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("empty status received")]
    EmptyStatus,

    #[error("unexpected status received: {0}")]
    UnexpectedStatus(String),
}

impl From<TranscriptionError> for JobServiceError {
    fn from(err: TranscriptionError) -> Self {
        match err {
            TranscriptionError::EmptyStatus => JobServiceError::EmptyStatus,
            TranscriptionError::UnexpectedStatus(value) => JobServiceError::UnexpectedStatus(value),
            TranscriptionError::Decode(msg) => JobServiceError::InvalidResponse(msg),
        }
    }
}

/// 执行策略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    /// 执行超时（毫秒）
    #[serde(rename = "executionTimeout")]
    pub execution_timeout: u64,
    pub priority: u32,
    /// 任务存活时间（毫秒）
    pub ttl: u64,
}

/// 结果上传到 S3 兼容存储的配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    pub access_id: String,
    pub access_secret: String,
    pub bucket_name: String,
    pub endpoint_url: String,
}

/// 任务提交请求体
///
/// 可选字段未设置时不出现在请求体中（不发送 null）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRequest {
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<ExecutionPolicy>,
    #[serde(rename = "s3Config", skip_serializing_if = "Option::is_none")]
    pub s3_config: Option<S3Config>,
}

impl RunRequest {
    pub fn new(input: Value) -> Self {
        Self {
            input,
            webhook: None,
            policy: None,
            s3_config: None,
        }
    }

    pub fn with_webhook(mut self, webhook: Option<String>) -> Self {
        self.webhook = webhook;
        self
    }

    pub fn with_policy(mut self, policy: Option<ExecutionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_s3_config(mut self, s3_config: Option<S3Config>) -> Self {
        self.s3_config = s3_config;
        self
    }
}

/// 提交 / 取消结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSubmission {
    pub job_id: String,
    pub status: JobStatus,
}

/// 任务状态快照
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub delay_time_ms: u64,
    pub execution_time_ms: u64,
    /// 原始输出，只在结果解析时解码一次
    pub output: Option<Value>,
}

/// 任务计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCounters {
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub in_progress: u64,
    #[serde(default)]
    pub in_queue: u64,
    #[serde(default)]
    pub retried: u64,
}

/// Worker 计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerCounters {
    #[serde(default)]
    pub idle: u64,
    #[serde(default)]
    pub initializing: u64,
    #[serde(default)]
    pub ready: u64,
    #[serde(default)]
    pub running: u64,
    #[serde(default)]
    pub throttled: u64,
    #[serde(default)]
    pub unhealthy: u64,
}

/// Endpoint 健康状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointHealth {
    #[serde(default)]
    pub jobs: JobCounters,
    #[serde(default)]
    pub workers: WorkerCounters,
}

/// 清空队列结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeQueueResult {
    #[serde(default)]
    pub removed: u64,
    #[serde(default)]
    pub status: String,
}

/// Job Service Port
///
/// 所有调用都带 endpoint 基础 URL，鉴权由实现负责
#[async_trait]
pub trait JobServicePort: Send + Sync {
    /// 异步提交 (`/run`)
    async fn run(&self, endpoint: &str, request: &RunRequest) -> Result<JobSubmission, JobServiceError>;

    /// 同步提交 (`/runsync`)，短任务直接返回结果
    async fn run_sync(&self, endpoint: &str, request: &RunRequest) -> Result<JobSnapshot, JobServiceError>;

    /// 查询状态 (`/status/{id}`)
    async fn status(&self, endpoint: &str, job_id: &str) -> Result<JobSnapshot, JobServiceError>;

    /// 取消任务 (`/cancel/{id}`)
    async fn cancel(&self, endpoint: &str, job_id: &str) -> Result<JobSubmission, JobServiceError>;

    /// 健康检查 (`/health`)
    async fn health(&self, endpoint: &str) -> Result<EndpointHealth, JobServiceError>;

    /// 清空队列 (`/purge-queue`)
    async fn purge_queue(&self, endpoint: &str) -> Result<PurgeQueueResult, JobServiceError>;
}
