//! Upload Context - 上传会话

use serde::Serialize;

use super::{UploadId, MAX_PARTS, PART_SIZE_BYTES};

/// 根据文件大小计算分片数量
///
/// 整除固定分片大小；结果为 0 时取 1，超过 32 时截断为 32。
/// 超大文件不会被拒绝，而是被切成 32 个更大的分片。
pub fn calculate_num_parts(file_size_bytes: i64) -> u32 {
    if file_size_bytes <= 0 {
        return 1;
    }
    let num_parts = file_size_bytes as u64 / PART_SIZE_BYTES;
    if num_parts == 0 {
        return 1;
    }
    if num_parts > u64::from(MAX_PARTS) {
        return MAX_PARTS;
    }
    num_parts as u32
}

/// 分片上传会话
///
/// 没有服务端持久化，只能由调用方回传的值重建。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSession {
    pub upload_id: UploadId,
    pub num_parts: u32,
    pub part_size_bytes: u64,
}

impl UploadSession {
    /// 为声明的文件大小开启新会话
    pub fn start(file_size_bytes: i64) -> Self {
        Self {
            upload_id: UploadId::generate(),
            num_parts: calculate_num_parts(file_size_bytes),
            part_size_bytes: PART_SIZE_BYTES,
        }
    }
}
