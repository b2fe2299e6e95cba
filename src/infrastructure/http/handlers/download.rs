//! Download HTTP Handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::application::{CreateDownloadUrlCommand, PresignedUrlResponse};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadUrlRequest {
    pub key: String,
}

/// 获取对象下载 URL
pub async fn presigned_download_url(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DownloadUrlRequest>,
) -> Result<Json<ApiResponse<PresignedUrlResponse>>, ApiError> {
    let response = state
        .download_url_handler
        .handle(CreateDownloadUrlCommand { key: req.key })
        .await?;

    Ok(Json(ApiResponse::success(response)))
}
