//! Transcription Commands - 转写任务相关命令

use crate::application::ports::{ExecutionPolicy, S3Config};
use crate::domain::transcription::{JobStatus, TranscriptionInput, TranscriptionOutcome};

/// 提交转写任务
#[derive(Debug, Clone)]
pub struct SubmitTranscriptionCommand {
    pub input: TranscriptionInput,
    pub webhook: Option<String>,
    pub policy: Option<ExecutionPolicy>,
    pub s3_config: Option<S3Config>,
}

impl SubmitTranscriptionCommand {
    pub fn new(input: TranscriptionInput) -> Self {
        Self {
            input,
            webhook: None,
            policy: None,
            s3_config: None,
        }
    }
}

/// 提交 / 取消响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobAcceptedResponse {
    pub job_id: String,
    pub status: JobStatus,
}

/// 同步转写响应
#[derive(Debug, Clone)]
pub struct SyncTranscriptionResponse {
    pub job_id: String,
    pub delay_time_ms: u64,
    pub execution_time_ms: u64,
    pub outcome: TranscriptionOutcome,
}

/// 取消转写任务
#[derive(Debug, Clone)]
pub struct CancelTranscriptionCommand {
    pub job_id: String,
}

/// 清空转写队列
#[derive(Debug, Clone, Default)]
pub struct PurgeTranscriptionQueueCommand;
