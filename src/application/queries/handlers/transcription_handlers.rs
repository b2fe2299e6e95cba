//! Transcription Query Handlers

use serde::Serialize;
use std::sync::Arc;

use crate::application::commands::handlers::validate_job_id;
use crate::application::error::ApplicationError;
use crate::application::ports::{EndpointHealth, JobSnapshot};
use crate::application::queries::{
    CheckTranscriptionHealth, GetTranscriptionResult, GetTranscriptionStatus,
};
use crate::application::services::TranscriptionJobClient;
use crate::domain::transcription::{JobStatus, TranscriptionOutcome};

// ============================================================================
// Response DTOs
// ============================================================================

/// 任务状态响应（不含输出）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptionStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub terminal: bool,
    pub delay_time_ms: u64,
    pub execution_time_ms: u64,
}

impl From<&JobSnapshot> for TranscriptionStatusResponse {
    fn from(snapshot: &JobSnapshot) -> Self {
        Self {
            job_id: snapshot.job_id.clone(),
            status: snapshot.status,
            terminal: snapshot.status.is_terminal(),
            delay_time_ms: snapshot.delay_time_ms,
            execution_time_ms: snapshot.execution_time_ms,
        }
    }
}

/// 任务结果响应
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionResultResponse {
    pub job_id: String,
    #[serde(flatten)]
    pub outcome: TranscriptionOutcome,
}

// ============================================================================
// Handlers
// ============================================================================

/// GetTranscriptionStatus Handler
pub struct GetTranscriptionStatusHandler {
    client: Arc<TranscriptionJobClient>,
}

impl GetTranscriptionStatusHandler {
    pub fn new(client: Arc<TranscriptionJobClient>) -> Self {
        Self { client }
    }

    pub async fn handle(
        &self,
        query: GetTranscriptionStatus,
    ) -> Result<TranscriptionStatusResponse, ApplicationError> {
        let job_id = validate_job_id(&query.job_id)?;
        let snapshot = self.client.status(job_id).await?;
        Ok(TranscriptionStatusResponse::from(&snapshot))
    }
}

/// GetTranscriptionResult Handler
///
/// 拉取一次状态并解析：
/// - 排队 / 运行中 → InProgress
/// - 完成 → 解码输出，解码失败为错误
/// - 失败 / 取消 / 超时 → Failed（不是错误）
/// - 空状态、未知状态 → 协议错误
pub struct GetTranscriptionResultHandler {
    client: Arc<TranscriptionJobClient>,
}

impl GetTranscriptionResultHandler {
    pub fn new(client: Arc<TranscriptionJobClient>) -> Self {
        Self { client }
    }

    pub async fn handle(
        &self,
        query: GetTranscriptionResult,
    ) -> Result<TranscriptionResultResponse, ApplicationError> {
        let job_id = validate_job_id(&query.job_id)?;
        let snapshot = self.client.status(job_id).await?;

        let outcome = TranscriptionOutcome::resolve(snapshot.status, snapshot.output)
            .map_err(|e| {
                tracing::error!(job_id = %snapshot.job_id, error = %e, "Failed to resolve transcription result");
                ApplicationError::from(e)
            })?;

        if let TranscriptionOutcome::Failed { status } = &outcome {
            tracing::warn!(job_id = %snapshot.job_id, status = %status, "Transcription job ended without output");
        }

        Ok(TranscriptionResultResponse {
            job_id: snapshot.job_id,
            outcome,
        })
    }
}

/// TranscriptionHealth Handler
pub struct TranscriptionHealthHandler {
    client: Arc<TranscriptionJobClient>,
}

impl TranscriptionHealthHandler {
    pub fn new(client: Arc<TranscriptionJobClient>) -> Self {
        Self { client }
    }

    pub async fn handle(
        &self,
        _query: CheckTranscriptionHealth,
    ) -> Result<EndpointHealth, ApplicationError> {
        Ok(self.client.health_check().await?)
    }
}
