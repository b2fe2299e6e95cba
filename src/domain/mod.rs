//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Upload Context: 分片上传（分片计算、key 推导、校验）
//! - Transcription Context: 远程转写任务（状态、参数、结果）

pub mod transcription;
pub mod upload;
