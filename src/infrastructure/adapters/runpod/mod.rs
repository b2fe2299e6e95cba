//! Inference Job Service Adapters
//!
//! - RunpodJobClient: 通过 HTTP 调用 serverless endpoint
//! - FakeJobService: 进程内实现，用于本地开发和测试

mod fake_job_service;
mod runpod_client;

pub use fake_job_service::FakeJobService;
pub use runpod_client::{RunpodClientConfig, RunpodJobClient};
