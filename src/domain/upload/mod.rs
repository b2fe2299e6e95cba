//! Upload Context - 分片上传限界上下文
//!
//! 职责:
//! - 分片数量计算（固定 64 MiB 分片，最多 32 片）
//! - Upload ID 与分片对象 key 的确定性推导
//! - 对象 key 校验

mod errors;
mod session;
mod value_objects;

pub use errors::UploadError;
pub use session::{calculate_num_parts, UploadSession};
pub use value_objects::{part_key, ObjectKey, PartNumber, UploadId};

use std::time::Duration;

/// 单个分片大小（64 MiB）
pub const PART_SIZE_BYTES: u64 = 64 * 1024 * 1024;

/// 最大分片数量
pub const MAX_PARTS: u32 = 32;

/// 签名 URL 有效期（15 分钟）
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(15 * 60);
