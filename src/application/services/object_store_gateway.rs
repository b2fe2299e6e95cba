//! Object Store Gateway
//!
//! 包装 ObjectStoragePort，统一错误语义：
//! - `exists`: 不存在返回 false，其余错误一律视为 StorageError
//! - `compose`: 任何失败都视为 ComposeError，不重复检查源对象
//! - `delete`: 尽力而为，由调用方决定是否忽略失败

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{ObjectHead, ObjectStoreError, ObjectStoragePort};

pub struct ObjectStoreGateway {
    storage: Arc<dyn ObjectStoragePort>,
    url_ttl: Duration,
}

impl ObjectStoreGateway {
    pub fn new(storage: Arc<dyn ObjectStoragePort>, url_ttl: Duration) -> Self {
        Self { storage, url_ttl }
    }

    /// 默认签名 URL 有效期
    pub fn url_ttl(&self) -> Duration {
        self.url_ttl
    }

    pub async fn presign_upload(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError> {
        let url = self.storage.sign_upload(key, ttl).await?;
        tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "Presigned upload URL");
        Ok(url)
    }

    pub async fn presign_download(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError> {
        let url = self.storage.sign_download(key, ttl).await?;
        tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "Presigned download URL");
        Ok(url)
    }

    pub async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        match self.storage.head_object(key).await {
            Ok(ObjectHead::Exists { .. }) => Ok(true),
            Ok(ObjectHead::NotFound) | Err(ObjectStoreError::NotFound(_)) => Ok(false),
            Err(ObjectStoreError::Storage(msg)) => Err(ObjectStoreError::Storage(msg)),
            Err(e) => Err(ObjectStoreError::Storage(e.to_string())),
        }
    }

    /// 调用方必须先确认全部源对象存在
    pub async fn compose(&self, dest_key: &str, source_keys: &[String]) -> Result<(), ObjectStoreError> {
        match self.storage.compose_objects(dest_key, source_keys).await {
            Ok(()) => {
                tracing::info!(dest = %dest_key, sources = source_keys.len(), "Objects composed");
                Ok(())
            }
            Err(ObjectStoreError::Compose(msg)) => Err(ObjectStoreError::Compose(msg)),
            Err(e) => Err(ObjectStoreError::Compose(e.to_string())),
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.storage.delete_object(key).await
    }
}
