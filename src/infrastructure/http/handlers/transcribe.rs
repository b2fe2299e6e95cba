//! Transcribe HTTP Handlers - 转写任务

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{
    CancelTranscriptionCommand, CheckTranscriptionHealth, EndpointHealth, ExecutionPolicy,
    GetTranscriptionResult, GetTranscriptionStatus, JobAcceptedResponse, PurgeQueueResult,
    PurgeTranscriptionQueueCommand, S3Config, SubmitTranscriptionCommand,
    TranscriptionResultResponse,
};
use crate::domain::transcription::{JobStatus, TranscriptionInput, TranscriptionOutcome};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

/// 提交请求：转写参数平铺在顶层，可附带回调与执行策略
#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    #[serde(flatten)]
    pub input: TranscriptionInput,
    #[serde(default)]
    pub webhook: Option<String>,
    #[serde(default)]
    pub policy: Option<ExecutionPolicy>,
    #[serde(default)]
    pub s3_config: Option<S3Config>,
}

impl From<TranscribeRequest> for SubmitTranscriptionCommand {
    fn from(req: TranscribeRequest) -> Self {
        Self {
            input: req.input,
            webhook: req.webhook,
            policy: req.policy,
            s3_config: req.s3_config,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: String,
    pub status: JobStatus,
}

impl From<JobAcceptedResponse> for JobResponse {
    fn from(accepted: JobAcceptedResponse) -> Self {
        Self {
            job_id: accepted.job_id,
            status: accepted.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    /// 排队时长（毫秒）
    pub delay_time: u64,
    /// 执行时长（毫秒）
    pub execution_time: u64,
}

#[derive(Debug, Serialize)]
pub struct SyncRunResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub delay_time: u64,
    pub execution_time: u64,
    pub outcome: TranscriptionOutcome,
}

// ============================================================================
// Handlers
// ============================================================================

/// 异步提交转写任务
pub async fn start_transcription(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranscribeRequest>,
) -> Result<Json<ApiResponse<JobResponse>>, ApiError> {
    let accepted = state
        .submit_transcription_handler
        .handle(req.into())
        .await?;

    Ok(Json(ApiResponse::success(accepted.into())))
}

/// 同步转写，适合短音频
pub async fn run_transcription_sync(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranscribeRequest>,
) -> Result<Json<ApiResponse<SyncRunResponse>>, ApiError> {
    let result = state
        .submit_transcription_handler
        .handle_sync(req.into())
        .await?;

    Ok(Json(ApiResponse::success(SyncRunResponse {
        job_id: result.job_id,
        status: result.outcome.status(),
        delay_time: result.delay_time_ms,
        execution_time: result.execution_time_ms,
        outcome: result.outcome,
    })))
}

/// 查询任务状态
pub async fn transcription_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<ApiResponse<JobStatusResponse>>, ApiError> {
    let status = state
        .transcription_status_handler
        .handle(GetTranscriptionStatus { job_id })
        .await?;

    Ok(Json(ApiResponse::success(JobStatusResponse {
        job_id: status.job_id,
        status: status.status,
        delay_time: status.delay_time_ms,
        execution_time: status.execution_time_ms,
    })))
}

/// 获取任务结果
pub async fn transcription_result(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<ApiResponse<TranscriptionResultResponse>>, ApiError> {
    let result = state
        .transcription_result_handler
        .handle(GetTranscriptionResult { job_id })
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// 取消任务
pub async fn cancel_transcription(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<ApiResponse<JobResponse>>, ApiError> {
    let cancelled = state
        .cancel_transcription_handler
        .handle(CancelTranscriptionCommand { job_id })
        .await?;

    Ok(Json(ApiResponse::success(cancelled.into())))
}

/// endpoint 健康状态
pub async fn transcription_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<EndpointHealth>>, ApiError> {
    let health = state
        .transcription_health_handler
        .handle(CheckTranscriptionHealth)
        .await?;

    Ok(Json(ApiResponse::success(health)))
}

/// 清空排队任务
pub async fn purge_transcription_queue(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PurgeQueueResult>>, ApiError> {
    let result = state
        .purge_queue_handler
        .handle(PurgeTranscriptionQueueCommand)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}
