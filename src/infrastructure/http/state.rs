//! Application State
//!
//! 包含所有 Command/Query Handlers 以及签名 URL 数据面所需的依赖

use std::sync::Arc;
use std::time::Duration;

use crate::application::{
    // Command handlers
    CancelTranscriptionHandler, CompleteUploadHandler, CreateDownloadUrlHandler,
    GetPartUploadUrlHandler, PurgeTranscriptionQueueHandler, StartUploadHandler,
    SubmitTranscriptionHandler,
    // Query handlers
    GetTranscriptionResultHandler, GetTranscriptionStatusHandler, TranscriptionHealthHandler,
    // Ports & services
    JobServicePort, ObjectDataPort, ObjectStoreGateway, ObjectStoragePort, TranscriptionJobClient,
};
use crate::infrastructure::adapters::storage::UrlSigner;

/// 状态构建参数
#[derive(Debug, Clone)]
pub struct StateOptions {
    /// 签名 URL 有效期
    pub url_ttl: Duration,
    /// 合并后删除分片的最大并发数
    pub cleanup_concurrency: usize,
    /// 转写 endpoint 基础 URL
    pub inference_endpoint: String,
}

/// 应用状态
pub struct AppState {
    // ========== Data plane ==========
    /// 本地后端的数据面；托管 provider 时为 None，`/storage` 路由返回 404
    pub object_data: Option<Arc<dyn ObjectDataPort>>,
    pub signer: UrlSigner,

    // ========== Command Handlers ==========
    pub start_upload_handler: StartUploadHandler,
    pub part_upload_url_handler: GetPartUploadUrlHandler,
    pub complete_upload_handler: CompleteUploadHandler,
    pub download_url_handler: CreateDownloadUrlHandler,
    pub submit_transcription_handler: SubmitTranscriptionHandler,
    pub cancel_transcription_handler: CancelTranscriptionHandler,
    pub purge_queue_handler: PurgeTranscriptionQueueHandler,

    // ========== Query Handlers ==========
    pub transcription_status_handler: GetTranscriptionStatusHandler,
    pub transcription_result_handler: GetTranscriptionResultHandler,
    pub transcription_health_handler: TranscriptionHealthHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        object_storage: Arc<dyn ObjectStoragePort>,
        object_data: Option<Arc<dyn ObjectDataPort>>,
        signer: UrlSigner,
        job_service: Arc<dyn JobServicePort>,
        options: StateOptions,
    ) -> Self {
        let gateway = Arc::new(ObjectStoreGateway::new(object_storage, options.url_ttl));
        let jobs = Arc::new(TranscriptionJobClient::new(
            job_service,
            options.inference_endpoint,
        ));

        Self {
            object_data,
            signer,

            // Command handlers
            start_upload_handler: StartUploadHandler::new(),
            part_upload_url_handler: GetPartUploadUrlHandler::new(gateway.clone()),
            complete_upload_handler: CompleteUploadHandler::new(
                gateway.clone(),
                options.cleanup_concurrency,
            ),
            download_url_handler: CreateDownloadUrlHandler::new(gateway.clone()),
            submit_transcription_handler: SubmitTranscriptionHandler::new(jobs.clone()),
            cancel_transcription_handler: CancelTranscriptionHandler::new(jobs.clone()),
            purge_queue_handler: PurgeTranscriptionQueueHandler::new(jobs.clone()),

            // Query handlers
            transcription_status_handler: GetTranscriptionStatusHandler::new(jobs.clone()),
            transcription_result_handler: GetTranscriptionResultHandler::new(jobs.clone()),
            transcription_health_handler: TranscriptionHealthHandler::new(jobs),
        }
    }
}
