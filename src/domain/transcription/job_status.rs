//! Transcription Context - 远程任务状态

use serde::{Deserialize, Serialize};

use super::TranscriptionError;

/// 远程任务状态
///
/// 状态迁移完全由远端服务决定，本地只通过轮询观察。
/// 线上取值大小写敏感，见 [`JobStatus::as_wire`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// 在队列中等待 worker
    #[serde(rename = "IN_QUEUE")]
    Queued,
    /// worker 正在处理
    #[serde(rename = "IN_PROGRESS")]
    Running,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
    /// 完成前被手动取消
    #[serde(rename = "CANCELLED")]
    Cancelled,
    /// 处理前过期，或 worker 未及时上报结果
    #[serde(rename = "TIMED_OUT")]
    TimedOut,
}

impl JobStatus {
    pub fn as_wire(&self) -> &'static str {
        match self {
            JobStatus::Queued => "IN_QUEUE",
            JobStatus::Running => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::TimedOut => "TIMED_OUT",
        }
    }

    /// 解析远端返回的状态字符串
    ///
    /// 空字符串和未知取值都属于协议违例，不作为瞬时错误重试。
    pub fn from_wire(value: &str) -> Result<Self, TranscriptionError> {
        match value {
            "IN_QUEUE" => Ok(JobStatus::Queued),
            "IN_PROGRESS" => Ok(JobStatus::Running),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            "CANCELLED" => Ok(JobStatus::Cancelled),
            "TIMED_OUT" => Ok(JobStatus::TimedOut),
            "" => Err(TranscriptionError::EmptyStatus),
            other => Err(TranscriptionError::UnexpectedStatus(other.to_string())),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Running)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// job id 最大长度
pub const MAX_JOB_ID_LEN: usize = 128;

/// job id 会作为单个路径段拼进 endpoint URL，只允许 ASCII 字母、数字、`-`、`_`
pub fn is_valid_job_id(job_id: &str) -> bool {
    !job_id.is_empty()
        && job_id.len() <= MAX_JOB_ID_LEN
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
