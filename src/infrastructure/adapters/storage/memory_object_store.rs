//! Memory Object Store - 内存对象存储
//!
//! 进程内存储，重启即丢失。用于开发环境和测试。

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use futures_util::stream::{self, StreamExt};
use std::time::Duration;

use super::{validate_key, UrlSigner};
use crate::application::ports::{
    ObjectDataPort, ObjectHead, ObjectStoreError, ObjectStoragePort, ObjectStream, SignedMethod,
    MAX_COMPOSE_SOURCES,
};

/// 内存对象存储
pub struct MemoryObjectStore {
    signer: UrlSigner,
    objects: DashMap<String, Bytes>,
}

impl MemoryObjectStore {
    pub fn new(signer: UrlSigner) -> Self {
        Self {
            signer,
            objects: DashMap::new(),
        }
    }

    /// 对象数量
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStoragePort for MemoryObjectStore {
    async fn sign_upload(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError> {
        validate_key(key)?;
        self.signer.sign(SignedMethod::Put, key, ttl)
    }

    async fn sign_download(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError> {
        validate_key(key)?;
        self.signer.sign(SignedMethod::Get, key, ttl)
    }

    async fn head_object(&self, key: &str) -> Result<ObjectHead, ObjectStoreError> {
        Ok(match self.objects.get(key) {
            Some(data) => ObjectHead::Exists {
                size: data.len() as u64,
            },
            None => ObjectHead::NotFound,
        })
    }

    async fn compose_objects(&self, dest: &str, sources: &[String]) -> Result<(), ObjectStoreError> {
        validate_key(dest)?;
        if sources.is_empty() || sources.len() > MAX_COMPOSE_SOURCES {
            return Err(ObjectStoreError::Compose(format!(
                "compose accepts 1 to {} sources, got {}",
                MAX_COMPOSE_SOURCES,
                sources.len()
            )));
        }

        let mut merged = BytesMut::new();
        for source in sources {
            let data = self
                .objects
                .get(source)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| {
                    ObjectStoreError::Compose(format!("source object {} not found", source))
                })?;
            merged.extend_from_slice(&data);
        }

        self.objects.insert(dest.to_string(), merged.freeze());
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl ObjectDataPort for MemoryObjectStore {
    async fn put_object(&self, key: &str, data: Bytes) -> Result<u64, ObjectStoreError> {
        validate_key(key)?;
        let size = data.len() as u64;
        self.objects.insert(key.to_string(), data);
        Ok(size)
    }

    async fn get_object(&self, key: &str) -> Result<(u64, ObjectStream), ObjectStoreError> {
        let data = self
            .objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))?;
        let size = data.len() as u64;
        Ok((size, stream::once(async move { Ok(data) }).boxed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryObjectStore {
        MemoryObjectStore::new(UrlSigner::new("http://localhost", "secret"))
    }

    #[tokio::test]
    async fn test_put_head_delete() {
        let store = store();
        store.put_object("a", Bytes::from_static(b"hello")).await.unwrap();
        assert_eq!(
            store.head_object("a").await.unwrap(),
            ObjectHead::Exists { size: 5 }
        );

        store.delete_object("a").await.unwrap();
        assert_eq!(store.head_object("a").await.unwrap(), ObjectHead::NotFound);
        assert!(matches!(
            store.delete_object("a").await,
            Err(ObjectStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_compose_overwrites_destination() {
        let store = store();
        store.put_object("dest", Bytes::from_static(b"old")).await.unwrap();
        store.put_object("p0", Bytes::from_static(b"ab")).await.unwrap();
        store.put_object("p1", Bytes::from_static(b"cd")).await.unwrap();

        store
            .compose_objects("dest", &["p0".to_string(), "p1".to_string()])
            .await
            .unwrap();
        let (size, mut stream) = store.get_object("dest").await.unwrap();
        assert_eq!(size, 4);
        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from_static(b"abcd"));
        // 源对象保留
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_compose_rejects_bad_sources() {
        let store = store();
        assert!(matches!(
            store.compose_objects("d", &[]).await,
            Err(ObjectStoreError::Compose(_))
        ));
        assert!(matches!(
            store.compose_objects("d", &["missing".to_string()]).await,
            Err(ObjectStoreError::Compose(_))
        ));

        let too_many: Vec<String> = (0..33).map(|i| format!("p{}", i)).collect();
        for key in &too_many {
            store.put_object(key, Bytes::from_static(b"x")).await.unwrap();
        }
        assert!(matches!(
            store.compose_objects("d", &too_many).await,
            Err(ObjectStoreError::Compose(_))
        ));
        assert_eq!(store.head_object("d").await.unwrap(), ObjectHead::NotFound);
    }

    #[tokio::test]
    async fn test_sign_rejects_invalid_key() {
        let store = store();
        let err = store
            .sign_upload("../escape", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, ObjectStoreError::InvalidKey(_)));
    }
}
