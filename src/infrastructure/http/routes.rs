//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                            GET   存活检查
//! - /api/upload/start-multipart          POST  开启分片上传
//! - /api/upload/presigned-part-url       POST  获取分片上传 URL
//! - /api/upload/complete-multipart       POST  合并分片
//! - /api/download/presigned-url          POST  获取下载 URL
//! - /api/transcribe/start                POST  异步提交转写
//! - /api/transcribe/run-sync             POST  同步转写
//! - /api/transcribe/status/:job_id       GET   任务状态
//! - /api/transcribe/result/:job_id       GET   任务结果
//! - /api/transcribe/cancel/:job_id       POST  取消任务
//! - /api/transcribe/health               GET   endpoint 健康状态
//! - /api/transcribe/purge-queue          POST  清空队列
//! - /storage/*key                        PUT/GET 签名 URL 数据面

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes()).route(
        "/storage/*key",
        put(handlers::put_object).get(handlers::get_object),
    )
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/upload", upload_routes())
        .route("/download/presigned-url", post(handlers::presigned_download_url))
        .nest("/transcribe", transcribe_routes())
}

/// Upload 路由
fn upload_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start-multipart", post(handlers::start_multipart))
        .route("/presigned-part-url", post(handlers::presigned_part_url))
        .route("/complete-multipart", post(handlers::complete_multipart))
}

/// Transcribe 路由
fn transcribe_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start", post(handlers::start_transcription))
        .route("/run-sync", post(handlers::run_transcription_sync))
        .route("/status/:job_id", get(handlers::transcription_status))
        .route("/result/:job_id", get(handlers::transcription_result))
        .route("/cancel/:job_id", post(handlers::cancel_transcription))
        .route("/health", get(handlers::transcription_health))
        .route("/purge-queue", post(handlers::purge_transcription_queue))
}
