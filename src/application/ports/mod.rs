//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod job_service;
mod object_storage;

pub use job_service::{
    EndpointHealth, ExecutionPolicy, JobCounters, JobServiceError, JobServicePort, JobSnapshot,
    JobSubmission, PurgeQueueResult, RunRequest, S3Config, WorkerCounters,
};
pub use object_storage::{
    ObjectDataPort, ObjectHead, ObjectStoreError, ObjectStoragePort, ObjectStream, SignedMethod,
    MAX_COMPOSE_SOURCES,
};
