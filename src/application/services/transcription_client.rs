//! Transcription Job Client
//!
//! 绑定转写 endpoint 的任务客户端，负责把 TranscriptionInput 包装为请求体。

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    EndpointHealth, ExecutionPolicy, JobServiceError, JobServicePort, JobSnapshot, JobSubmission,
    PurgeQueueResult, RunRequest, S3Config,
};
use crate::domain::transcription::{TranscriptionInput, TranscriptionOutcome};

/// 同步转写结果
#[derive(Debug, Clone)]
pub struct SyncTranscription {
    pub job_id: String,
    pub delay_time_ms: u64,
    pub execution_time_ms: u64,
    pub outcome: TranscriptionOutcome,
}

pub struct TranscriptionJobClient {
    service: Arc<dyn JobServicePort>,
    endpoint: String,
}

impl TranscriptionJobClient {
    pub fn new(service: Arc<dyn JobServicePort>, endpoint: impl Into<String>) -> Self {
        Self {
            service,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(
        input: &TranscriptionInput,
        webhook: Option<String>,
        policy: Option<ExecutionPolicy>,
        s3_config: Option<S3Config>,
    ) -> Result<RunRequest, JobServiceError> {
        let input = serde_json::to_value(input)
            .map_err(|e| JobServiceError::InvalidRequest(e.to_string()))?;
        Ok(RunRequest::new(input)
            .with_webhook(webhook)
            .with_policy(policy)
            .with_s3_config(s3_config))
    }

    /// 异步提交
    pub async fn submit(
        &self,
        input: &TranscriptionInput,
        webhook: Option<String>,
        policy: Option<ExecutionPolicy>,
        s3_config: Option<S3Config>,
    ) -> Result<JobSubmission, JobServiceError> {
        let request = Self::build_request(input, webhook, policy, s3_config)?;
        tracing::info!(
            endpoint = %self.endpoint,
            model = ?input.model,
            "Submitting transcription job"
        );
        self.service.run(&self.endpoint, &request).await
    }

    /// 同步提交，返回解码后的结果
    pub async fn submit_sync(
        &self,
        input: &TranscriptionInput,
        webhook: Option<String>,
        policy: Option<ExecutionPolicy>,
        s3_config: Option<S3Config>,
    ) -> Result<SyncTranscription, ApplicationError> {
        let request = Self::build_request(input, webhook, policy, s3_config)?;
        tracing::info!(
            endpoint = %self.endpoint,
            model = ?input.model,
            "Running transcription job synchronously"
        );
        let snapshot = self.service.run_sync(&self.endpoint, &request).await?;
        let outcome = TranscriptionOutcome::resolve(snapshot.status, snapshot.output)?;

        Ok(SyncTranscription {
            job_id: snapshot.job_id,
            delay_time_ms: snapshot.delay_time_ms,
            execution_time_ms: snapshot.execution_time_ms,
            outcome,
        })
    }

    pub async fn status(&self, job_id: &str) -> Result<JobSnapshot, JobServiceError> {
        self.service.status(&self.endpoint, job_id).await
    }

    pub async fn cancel(&self, job_id: &str) -> Result<JobSubmission, JobServiceError> {
        self.service.cancel(&self.endpoint, job_id).await
    }

    pub async fn health_check(&self) -> Result<EndpointHealth, JobServiceError> {
        self.service.health(&self.endpoint).await
    }

    pub async fn purge_queue(&self) -> Result<PurgeQueueResult, JobServiceError> {
        self.service.purge_queue(&self.endpoint).await
    }
}
