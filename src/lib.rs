//! Scribeline - 分片上传协调 + 远程转写任务网关
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Upload Context: 分片计划、对象 key、上传会话
//! - Transcription Context: 任务状态、转写参数、结果解析
//!
//! 应用层 (application/):
//! - Ports: ObjectStoragePort, ObjectDataPort, JobServicePort
//! - Services: ObjectStoreGateway, TranscriptionJobClient
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + 签名 URL 数据面
//! - Adapters: 文件/内存对象存储, URL 签名, RunPod 客户端

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
