//! Application Services
//!
//! 端口之上的薄封装，供 Command/Query Handlers 复用：
//! - ObjectStoreGateway: 对象存储网关（签名 URL、存在性、合并、删除）
//! - TranscriptionJobClient: 绑定转写 endpoint 的任务客户端

mod object_store_gateway;
mod transcription_client;

pub use object_store_gateway::ObjectStoreGateway;
pub use transcription_client::{SyncTranscription, TranscriptionJobClient};
