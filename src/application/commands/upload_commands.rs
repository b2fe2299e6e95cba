//! Upload Commands - 分片上传相关命令

use serde::Serialize;

use crate::domain::upload::UploadSession;

/// 开启分片上传
#[derive(Debug, Clone)]
pub struct StartUploadCommand {
    pub file_size_bytes: i64,
}

/// 开启分片上传响应
pub type StartUploadResponse = UploadSession;

/// 获取分片上传 URL
#[derive(Debug, Clone)]
pub struct GetPartUploadUrlCommand {
    pub upload_id: String,
    pub part_number: i64,
    /// 调用方回传的会话分片数，存在时进一步收紧序号上界
    pub num_parts: Option<u32>,
}

/// 完成分片上传
#[derive(Debug, Clone)]
pub struct CompleteUploadCommand {
    pub key: String,
    pub upload_id: String,
    pub num_parts: i64,
}

/// 完成分片上传报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompleteUploadReport {
    pub key: String,
    pub num_parts: u32,
    /// 清理阶段删除失败、遗留在存储中的分片 key
    pub orphaned_parts: Vec<String>,
}

/// 获取下载 URL
#[derive(Debug, Clone)]
pub struct CreateDownloadUrlCommand {
    pub key: String,
}

/// 签名 URL 响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignedUrlResponse {
    pub url: String,
    pub expires_in_secs: u64,
}
