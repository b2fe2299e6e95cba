//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（ObjectStorage、ObjectData、JobService）
//! - services: 端口之上的薄封装（对象存储网关、转写任务客户端）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;

// Re-exports
pub use commands::{
    // Upload commands
    CompleteUploadCommand,
    CompleteUploadReport,
    CreateDownloadUrlCommand,
    GetPartUploadUrlCommand,
    PresignedUrlResponse,
    StartUploadCommand,
    StartUploadResponse,
    // Transcription commands
    CancelTranscriptionCommand,
    JobAcceptedResponse,
    PurgeTranscriptionQueueCommand,
    SubmitTranscriptionCommand,
    SyncTranscriptionResponse,
    // Handlers
    handlers::{
        CancelTranscriptionHandler, CompleteUploadHandler, CreateDownloadUrlHandler,
        GetPartUploadUrlHandler, PurgeTranscriptionQueueHandler, StartUploadHandler,
        SubmitTranscriptionHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Object storage
    ObjectDataPort,
    ObjectHead,
    ObjectStoragePort,
    ObjectStoreError,
    ObjectStream,
    SignedMethod,
    // Job service
    EndpointHealth,
    ExecutionPolicy,
    JobServiceError,
    JobServicePort,
    JobSnapshot,
    JobSubmission,
    PurgeQueueResult,
    RunRequest,
    S3Config,
};

pub use queries::{
    CheckTranscriptionHealth,
    GetTranscriptionResult,
    GetTranscriptionStatus,
    // Handlers
    handlers::{
        GetTranscriptionResultHandler, GetTranscriptionStatusHandler, TranscriptionHealthHandler,
        TranscriptionResultResponse, TranscriptionStatusResponse,
    },
};

pub use services::{ObjectStoreGateway, SyncTranscription, TranscriptionJobClient};
