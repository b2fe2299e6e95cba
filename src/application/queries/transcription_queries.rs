//! Transcription Queries

/// 查询任务状态
#[derive(Debug, Clone)]
pub struct GetTranscriptionStatus {
    pub job_id: String,
}

/// 查询并解析任务结果
#[derive(Debug, Clone)]
pub struct GetTranscriptionResult {
    pub job_id: String,
}

/// 查询 endpoint 健康状态
#[derive(Debug, Clone, Default)]
pub struct CheckTranscriptionHealth;
