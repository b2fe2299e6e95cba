//! Storage Adapters - 对象存储实现
//!
//! - FileObjectStore: 本地文件系统
//! - MemoryObjectStore: 进程内存
//!
//! 两者都通过 UrlSigner 签发指向本服务 `/storage/*key` 的 URL

mod file_object_store;
mod memory_object_store;
mod url_signer;

pub use file_object_store::FileObjectStore;
pub use memory_object_store::MemoryObjectStore;
pub use url_signer::{SignatureError, UrlSigner};

use crate::application::ports::ObjectStoreError;
use crate::domain::upload::ObjectKey;

/// 校验存储 key，防止越出存储根目录
pub(crate) fn validate_key(key: &str) -> Result<(), ObjectStoreError> {
    ObjectKey::parse(key)
        .map(|_| ())
        .map_err(|e| ObjectStoreError::InvalidKey(e.to_string()))
}
