//! File Object Store - 文件系统对象存储实现
//!
//! 目录结构：
//! - `{root}/objects/{key}`: 对象内容，key 中的 `/` 映射为子目录
//! - `{root}/staging/`: 写入与合并的临时文件，完成后 rename 到目标位置

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use super::{validate_key, UrlSigner};
use crate::application::ports::{
    ObjectDataPort, ObjectHead, ObjectStoreError, ObjectStoragePort, ObjectStream, SignedMethod,
    MAX_COMPOSE_SOURCES,
};

fn io_error(e: std::io::Error) -> ObjectStoreError {
    ObjectStoreError::Storage(e.to_string())
}

/// 文件系统对象存储
pub struct FileObjectStore {
    root: PathBuf,
    signer: UrlSigner,
}

impl FileObjectStore {
    /// 创建新的文件存储
    pub async fn new(root: impl AsRef<Path>, signer: UrlSigner) -> Result<Self, ObjectStoreError> {
        let root = root.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(root.join("objects")).await.map_err(io_error)?;
        fs::create_dir_all(root.join("staging")).await.map_err(io_error)?;

        tracing::info!(root = %root.display(), "File object store ready");
        Ok(Self { root, signer })
    }

    /// 获取存储根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        validate_key(key)?;
        Ok(self.root.join("objects").join(key))
    }

    fn staging_path(&self) -> PathBuf {
        self.root.join("staging").join(Uuid::new_v4().to_string())
    }

    /// 把暂存文件移动到对象位置，覆盖已有对象
    async fn publish(&self, staged: &Path, dest: &Path) -> Result<(), ObjectStoreError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        fs::rename(staged, dest).await.map_err(io_error)
    }

    async fn write_concatenated(
        &self,
        staged: &Path,
        sources: &[String],
    ) -> Result<u64, ObjectStoreError> {
        let mut out = fs::File::create(staged).await.map_err(io_error)?;
        let mut total = 0u64;
        for source in sources {
            let path = self.object_path(source)?;
            let mut input = match fs::File::open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(ObjectStoreError::Compose(format!(
                        "source object {} not found",
                        source
                    )))
                }
                Err(e) => return Err(io_error(e)),
            };
            total += tokio::io::copy(&mut input, &mut out).await.map_err(io_error)?;
        }
        out.flush().await.map_err(io_error)?;
        out.sync_all().await.map_err(io_error)?;
        Ok(total)
    }
}

#[async_trait]
impl ObjectStoragePort for FileObjectStore {
    async fn sign_upload(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError> {
        validate_key(key)?;
        self.signer.sign(SignedMethod::Put, key, ttl)
    }

    async fn sign_download(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError> {
        validate_key(key)?;
        self.signer.sign(SignedMethod::Get, key, ttl)
    }

    async fn head_object(&self, key: &str) -> Result<ObjectHead, ObjectStoreError> {
        let path = self.object_path(key)?;
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(ObjectHead::Exists {
                size: metadata.len(),
            }),
            Ok(_) => Ok(ObjectHead::NotFound),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ObjectHead::NotFound),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn compose_objects(&self, dest: &str, sources: &[String]) -> Result<(), ObjectStoreError> {
        let dest_path = self.object_path(dest)?;
        if sources.is_empty() || sources.len() > MAX_COMPOSE_SOURCES {
            return Err(ObjectStoreError::Compose(format!(
                "compose accepts 1 to {} sources, got {}",
                MAX_COMPOSE_SOURCES,
                sources.len()
            )));
        }

        let staged = self.staging_path();
        let result = match self.write_concatenated(&staged, sources).await {
            Ok(size) => self.publish(&staged, &dest_path).await.map(|_| size),
            Err(e) => Err(e),
        };

        match result {
            Ok(size) => {
                tracing::debug!(dest = %dest, sources = sources.len(), size, "Composed object");
                Ok(())
            }
            Err(e) => {
                // 目标保持原状，清理暂存文件
                let _ = fs::remove_file(&staged).await;
                Err(e)
            }
        }
    }

    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key = %key, "Deleted object");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ObjectStoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(io_error(e)),
        }
    }
}

#[async_trait]
impl ObjectDataPort for FileObjectStore {
    async fn put_object(&self, key: &str, data: Bytes) -> Result<u64, ObjectStoreError> {
        let dest = self.object_path(key)?;
        let staged = self.staging_path();

        if let Err(e) = fs::write(&staged, &data).await {
            let _ = fs::remove_file(&staged).await;
            return Err(io_error(e));
        }
        if let Err(e) = self.publish(&staged, &dest).await {
            let _ = fs::remove_file(&staged).await;
            return Err(e);
        }

        tracing::debug!(key = %key, size = data.len(), "Stored object");
        Ok(data.len() as u64)
    }

    async fn get_object(&self, key: &str) -> Result<(u64, ObjectStream), ObjectStoreError> {
        let path = self.object_path(key)?;
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ObjectStoreError::NotFound(key.to_string()))
            }
            Err(e) => return Err(io_error(e)),
        };
        let metadata = file.metadata().await.map_err(io_error)?;
        if !metadata.is_file() {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }

        Ok((metadata.len(), ReaderStream::new(file).boxed()))
    }
}
