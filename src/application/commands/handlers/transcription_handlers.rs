//! Transcription Command Handlers

use std::sync::Arc;

use crate::application::commands::transcription_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::PurgeQueueResult;
use crate::application::services::TranscriptionJobClient;
use crate::domain::transcription::{is_valid_job_id, MAX_JOB_ID_LEN};

/// job id 会拼进远端 URL 路径，必须是单个安全的路径段
pub(crate) fn validate_job_id(job_id: &str) -> Result<&str, ApplicationError> {
    let trimmed = job_id.trim();
    if trimmed.is_empty() {
        return Err(ApplicationError::validation("job id must not be empty"));
    }
    if !is_valid_job_id(trimmed) {
        return Err(ApplicationError::validation(format!(
            "job id must be at most {} ASCII letters, digits, '-' or '_'",
            MAX_JOB_ID_LEN
        )));
    }
    Ok(trimmed)
}

/// SubmitTranscription Handler
pub struct SubmitTranscriptionHandler {
    client: Arc<TranscriptionJobClient>,
}

impl SubmitTranscriptionHandler {
    pub fn new(client: Arc<TranscriptionJobClient>) -> Self {
        Self { client }
    }

    fn validate(cmd: &SubmitTranscriptionCommand) -> Result<(), ApplicationError> {
        if cmd.input.audio.trim().is_empty() {
            return Err(ApplicationError::validation("audio URL must not be empty"));
        }
        Ok(())
    }

    /// 异步提交，立即返回 job id
    pub async fn handle(
        &self,
        cmd: SubmitTranscriptionCommand,
    ) -> Result<JobAcceptedResponse, ApplicationError> {
        Self::validate(&cmd)?;
        let submission = self
            .client
            .submit(&cmd.input, cmd.webhook, cmd.policy, cmd.s3_config)
            .await?;

        tracing::info!(
            job_id = %submission.job_id,
            status = %submission.status,
            "Transcription job accepted"
        );

        Ok(JobAcceptedResponse {
            job_id: submission.job_id,
            status: submission.status,
        })
    }

    /// 同步提交，等待远端返回结果
    pub async fn handle_sync(
        &self,
        cmd: SubmitTranscriptionCommand,
    ) -> Result<SyncTranscriptionResponse, ApplicationError> {
        Self::validate(&cmd)?;
        let result = self
            .client
            .submit_sync(&cmd.input, cmd.webhook, cmd.policy, cmd.s3_config)
            .await?;

        Ok(SyncTranscriptionResponse {
            job_id: result.job_id,
            delay_time_ms: result.delay_time_ms,
            execution_time_ms: result.execution_time_ms,
            outcome: result.outcome,
        })
    }
}

/// CancelTranscription Handler
pub struct CancelTranscriptionHandler {
    client: Arc<TranscriptionJobClient>,
}

impl CancelTranscriptionHandler {
    pub fn new(client: Arc<TranscriptionJobClient>) -> Self {
        Self { client }
    }

    pub async fn handle(
        &self,
        cmd: CancelTranscriptionCommand,
    ) -> Result<JobAcceptedResponse, ApplicationError> {
        let job_id = validate_job_id(&cmd.job_id)?;
        let submission = self.client.cancel(job_id).await?;
        tracing::info!(job_id = %submission.job_id, status = %submission.status, "Transcription job cancelled");
        Ok(JobAcceptedResponse {
            job_id: submission.job_id,
            status: submission.status,
        })
    }
}

/// PurgeTranscriptionQueue Handler - 清空排队中的任务，不影响运行中任务
pub struct PurgeTranscriptionQueueHandler {
    client: Arc<TranscriptionJobClient>,
}

impl PurgeTranscriptionQueueHandler {
    pub fn new(client: Arc<TranscriptionJobClient>) -> Self {
        Self { client }
    }

    pub async fn handle(
        &self,
        _cmd: PurgeTranscriptionQueueCommand,
    ) -> Result<PurgeQueueResult, ApplicationError> {
        let result = self.client.purge_queue().await?;
        tracing::warn!(removed = result.removed, "Transcription queue purged");
        Ok(result)
    }
}
