//! Upload HTTP Handlers - 分片上传

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{
    CompleteUploadCommand, CompleteUploadReport, GetPartUploadUrlCommand, PresignedUrlResponse,
    StartUploadCommand,
};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartMultipartRequest {
    /// 仅用于日志
    #[serde(default)]
    pub filename: Option<String>,
    pub file_size_bytes: i64,
}

#[derive(Debug, Serialize)]
pub struct StartMultipartResponse {
    pub upload_id: String,
    pub num_parts: u32,
    pub part_size_bytes: u64,
}

#[derive(Debug, Deserialize)]
pub struct PartUrlRequest {
    pub upload_id: String,
    pub part_number: i64,
    #[serde(default)]
    pub num_parts: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteMultipartRequest {
    pub key: String,
    pub upload_id: String,
    pub num_parts: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// 开启分片上传
pub async fn start_multipart(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartMultipartRequest>,
) -> Result<Json<ApiResponse<StartMultipartResponse>>, ApiError> {
    if let Some(filename) = &req.filename {
        tracing::debug!(filename = %filename, "Start multipart upload requested");
    }

    let session = state.start_upload_handler.handle(StartUploadCommand {
        file_size_bytes: req.file_size_bytes,
    });

    Ok(Json(ApiResponse::success(StartMultipartResponse {
        upload_id: session.upload_id.to_string(),
        num_parts: session.num_parts,
        part_size_bytes: session.part_size_bytes,
    })))
}

/// 获取分片上传 URL
pub async fn presigned_part_url(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PartUrlRequest>,
) -> Result<Json<ApiResponse<PresignedUrlResponse>>, ApiError> {
    let response = state
        .part_upload_url_handler
        .handle(GetPartUploadUrlCommand {
            upload_id: req.upload_id,
            part_number: req.part_number,
            num_parts: req.num_parts,
        })
        .await?;

    Ok(Json(ApiResponse::success(response)))
}

/// 合并分片
pub async fn complete_multipart(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompleteMultipartRequest>,
) -> Result<Json<ApiResponse<CompleteUploadReport>>, ApiError> {
    let report = state
        .complete_upload_handler
        .handle(CompleteUploadCommand {
            key: req.key,
            upload_id: req.upload_id,
            num_parts: req.num_parts,
        })
        .await?;

    Ok(Json(ApiResponse::success(report)))
}
