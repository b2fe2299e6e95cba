//! Object Storage Port - 出站端口
//!
//! 对象存储能力抽象：签名 URL、存在性检查、合并、删除。
//! 具体 provider（本地文件、内存）在 infrastructure/adapters/storage 实现。

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use std::time::Duration;
use thiserror::Error;

/// 对象存储错误
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// 签名凭据不可用
    #[error("Signing credentials unavailable: {0}")]
    Credential(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// 合并失败（源对象缺失、超过源数量上限等）
    #[error("Compose error: {0}")]
    Compose(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),
}

/// HEAD 结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectHead {
    Exists { size: u64 },
    NotFound,
}

/// 签名 URL 对应的 HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedMethod {
    Put,
    Get,
}

impl SignedMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignedMethod::Put => "PUT",
            SignedMethod::Get => "GET",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PUT" => Some(SignedMethod::Put),
            "GET" => Some(SignedMethod::Get),
            _ => None,
        }
    }
}

/// 单次 compose 允许的最大源对象数量
pub const MAX_COMPOSE_SOURCES: usize = 32;

/// Object Storage Port
///
/// 控制面能力，对应 provider 的 SDK 调用
#[async_trait]
pub trait ObjectStoragePort: Send + Sync {
    /// 签发单个对象的 PUT URL，自签发起 `ttl` 内有效
    async fn sign_upload(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError>;

    /// 签发单个对象的 GET URL，自签发起 `ttl` 内有效
    async fn sign_download(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError>;

    /// 查询对象是否存在；不存在不是错误
    async fn head_object(&self, key: &str) -> Result<ObjectHead, ObjectStoreError>;

    /// 按顺序把 `sources` 合并为 `dest`，provider 侧原子完成，覆盖已有目标
    async fn compose_objects(&self, dest: &str, sources: &[String]) -> Result<(), ObjectStoreError>;

    /// 删除对象
    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError>;
}

/// 对象内容流
pub type ObjectStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Object Data Port
///
/// 数据面读写，由签名 URL 端点驱动。托管 provider 自己提供数据面，
/// 只有本地后端需要实现。
#[async_trait]
pub trait ObjectDataPort: Send + Sync {
    /// 写入（覆盖）对象
    async fn put_object(&self, key: &str, data: Bytes) -> Result<u64, ObjectStoreError>;

    /// 读取对象，返回 (大小, 内容流)
    async fn get_object(&self, key: &str) -> Result<(u64, ObjectStream), ObjectStoreError>;
}
