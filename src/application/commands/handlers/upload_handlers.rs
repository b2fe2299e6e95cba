//! Upload Command Handlers - 分片上传协调
//!
//! 服务端不保存会话状态，所有会话信息由调用方在每次请求中回传。

use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

use crate::application::commands::upload_commands::*;
use crate::application::error::ApplicationError;
use crate::application::services::ObjectStoreGateway;
use crate::domain::upload::{
    part_key, ObjectKey, PartNumber, UploadId, UploadSession, MAX_PARTS,
};

/// 调用方回传的分片数必须在 `[1, MAX_PARTS]` 内
fn validate_num_parts(num_parts: i64) -> Result<u32, ApplicationError> {
    if num_parts < 1 || num_parts > i64::from(MAX_PARTS) {
        return Err(ApplicationError::validation(format!(
            "number of parts must be between 1 and {}, got {}",
            MAX_PARTS, num_parts
        )));
    }
    Ok(num_parts as u32)
}

/// StartUpload Handler - 开启分片上传（无网络调用）
pub struct StartUploadHandler;

impl StartUploadHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, cmd: StartUploadCommand) -> StartUploadResponse {
        let session = UploadSession::start(cmd.file_size_bytes);
        tracing::info!(
            upload_id = %session.upload_id,
            file_size_bytes = cmd.file_size_bytes,
            num_parts = session.num_parts,
            "Multipart upload started"
        );
        session
    }
}

impl Default for StartUploadHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// GetPartUploadUrl Handler - 签发单个分片的上传 URL
pub struct GetPartUploadUrlHandler {
    gateway: Arc<ObjectStoreGateway>,
}

impl GetPartUploadUrlHandler {
    pub fn new(gateway: Arc<ObjectStoreGateway>) -> Self {
        Self { gateway }
    }

    pub async fn handle(
        &self,
        cmd: GetPartUploadUrlCommand,
    ) -> Result<PresignedUrlResponse, ApplicationError> {
        let upload_id = UploadId::parse(cmd.upload_id)?;
        let part_number = match cmd.num_parts {
            Some(num_parts) => {
                let num_parts = validate_num_parts(i64::from(num_parts))?;
                PartNumber::bounded(cmd.part_number, num_parts)?
            }
            None => PartNumber::new(cmd.part_number)?,
        };

        let key = part_key(&upload_id, part_number);
        let ttl = self.gateway.url_ttl();
        let url = self.gateway.presign_upload(&key, ttl).await?;

        tracing::debug!(
            upload_id = %upload_id,
            part_number = %part_number,
            "Issued part upload URL"
        );

        Ok(PresignedUrlResponse {
            url,
            expires_in_secs: ttl.as_secs(),
        })
    }
}

/// CompleteUpload Handler - 合并分片
///
/// 三个阶段严格按顺序执行，每个阶段全部完成后才进入下一阶段：
/// 1. 检查所有分片存在，发现第一个缺失分片即失败，不做部分合并
/// 2. 按分片序号升序合并到目标 key，失败时保留全部分片以便重试
/// 3. 删除全部分片，单个删除失败只记录日志，不影响结果
///
/// 阶段 1、2 可以安全重试（合并会覆盖目标）；阶段 3 删除分片后不能再单独重试阶段 2。
pub struct CompleteUploadHandler {
    gateway: Arc<ObjectStoreGateway>,
    cleanup_concurrency: usize,
}

impl CompleteUploadHandler {
    pub fn new(gateway: Arc<ObjectStoreGateway>, cleanup_concurrency: usize) -> Self {
        Self {
            gateway,
            cleanup_concurrency: cleanup_concurrency.max(1),
        }
    }

    pub async fn handle(
        &self,
        cmd: CompleteUploadCommand,
    ) -> Result<CompleteUploadReport, ApplicationError> {
        let dest = ObjectKey::parse(cmd.key)?;
        let upload_id = UploadId::parse(cmd.upload_id)?;
        let num_parts = validate_num_parts(cmd.num_parts)?;

        let part_keys: Vec<String> = PartNumber::range(num_parts)
            .map(|n| part_key(&upload_id, n))
            .collect();

        // 1. 存在性检查
        for (index, key) in part_keys.iter().enumerate() {
            let exists = self.gateway.exists(key).await.map_err(|e| {
                ApplicationError::StorageError(format!(
                    "failed to check if part {} exists: {}",
                    index, e
                ))
            })?;
            if !exists {
                tracing::warn!(
                    upload_id = %upload_id,
                    part_number = index,
                    "Part missing, aborting multipart upload completion"
                );
                return Err(ApplicationError::PartMissing(index as u32));
            }
        }

        // 2. 合并
        self.gateway.compose(dest.as_str(), &part_keys).await?;

        // 3. 清理
        let orphaned_parts = self.cleanup(&part_keys).await;

        tracing::info!(
            key = %dest,
            upload_id = %upload_id,
            num_parts = num_parts,
            orphaned = orphaned_parts.len(),
            "Multipart upload completed"
        );

        Ok(CompleteUploadReport {
            key: dest.into_string(),
            num_parts,
            orphaned_parts,
        })
    }

    /// 并发删除全部分片，返回删除失败的 key（按分片序号排序）
    async fn cleanup(&self, part_keys: &[String]) -> Vec<String> {
        let gateway = &self.gateway;

        let mut failures: Vec<(usize, String)> = stream::iter(part_keys.iter().cloned().enumerate())
            .map(|(index, key)| async move {
                let result = gateway.delete(&key).await;
                (index, key, result)
            })
            .buffer_unordered(self.cleanup_concurrency)
            .filter_map(|(index, key, result)| async move {
                match result {
                    Ok(()) => None,
                    Err(e) => {
                        tracing::warn!(part_key = %key, error = %e, "Failed to delete part");
                        Some((index, key))
                    }
                }
            })
            .collect()
            .await;

        failures.sort_by_key(|(index, _)| *index);
        failures.into_iter().map(|(_, key)| key).collect()
    }
}

/// CreateDownloadUrl Handler - 签发下载 URL
pub struct CreateDownloadUrlHandler {
    gateway: Arc<ObjectStoreGateway>,
}

impl CreateDownloadUrlHandler {
    pub fn new(gateway: Arc<ObjectStoreGateway>) -> Self {
        Self { gateway }
    }

    pub async fn handle(
        &self,
        cmd: CreateDownloadUrlCommand,
    ) -> Result<PresignedUrlResponse, ApplicationError> {
        let key = ObjectKey::parse(cmd.key)?;
        let ttl = self.gateway.url_ttl();
        let url = self.gateway.presign_download(key.as_str(), ttl).await?;
        Ok(PresignedUrlResponse {
            url,
            expires_in_secs: ttl.as_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        ObjectDataPort, ObjectHead, ObjectStoreError, ObjectStoragePort,
    };
    use crate::infrastructure::adapters::storage::{MemoryObjectStore, UrlSigner};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// 记录调用顺序的存储，可注入合并 / 删除失败
    struct RecordingStore {
        inner: MemoryObjectStore,
        calls: Mutex<Vec<String>>,
        fail_compose: AtomicBool,
        fail_deletes: Mutex<HashSet<String>>,
        /// 删除时挂起的时间，用于观察并发
        delete_delay: Mutex<Option<Duration>>,
        deletes_in_flight: AtomicUsize,
        max_deletes_in_flight: AtomicUsize,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                inner: MemoryObjectStore::new(UrlSigner::new("http://localhost:5060", "secret")),
                calls: Mutex::new(Vec::new()),
                fail_compose: AtomicBool::new(false),
                fail_deletes: Mutex::new(HashSet::new()),
                delete_delay: Mutex::new(None),
                deletes_in_flight: AtomicUsize::new(0),
                max_deletes_in_flight: AtomicUsize::new(0),
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn calls_with_prefix(&self, prefix: &str) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter(|c| c.starts_with(prefix))
                .collect()
        }
    }

    #[async_trait]
    impl ObjectStoragePort for RecordingStore {
        async fn sign_upload(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError> {
            self.inner.sign_upload(key, ttl).await
        }

        async fn sign_download(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError> {
            self.inner.sign_download(key, ttl).await
        }

        async fn head_object(&self, key: &str) -> Result<ObjectHead, ObjectStoreError> {
            self.record(format!("head:{}", key));
            self.inner.head_object(key).await
        }

        async fn compose_objects(&self, dest: &str, sources: &[String]) -> Result<(), ObjectStoreError> {
            self.record(format!("compose:{}:{}", dest, sources.join(",")));
            if self.fail_compose.load(Ordering::SeqCst) {
                return Err(ObjectStoreError::Compose("provider rejected".to_string()));
            }
            self.inner.compose_objects(dest, sources).await
        }

        async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
            self.record(format!("delete:{}", key));
            let in_flight = self.deletes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_deletes_in_flight.fetch_max(in_flight, Ordering::SeqCst);

            let delay = *self.delete_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let result = if self.fail_deletes.lock().unwrap().contains(key) {
                Err(ObjectStoreError::Storage("delete refused".to_string()))
            } else {
                self.inner.delete_object(key).await
            };
            self.deletes_in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn setup() -> (Arc<RecordingStore>, Arc<ObjectStoreGateway>) {
        let store = Arc::new(RecordingStore::new());
        let gateway = Arc::new(ObjectStoreGateway::new(store.clone(), Duration::from_secs(900)));
        (store, gateway)
    }

    async fn upload_parts(store: &RecordingStore, upload_id: &str, parts: &[&[u8]]) {
        let upload_id = UploadId::parse(upload_id).unwrap();
        for (i, data) in parts.iter().enumerate() {
            let key = part_key(&upload_id, PartNumber::new(i as i64).unwrap());
            store.inner.put_object(&key, Bytes::copy_from_slice(data)).await.unwrap();
        }
    }

    async fn read_all(store: &RecordingStore, key: &str) -> Vec<u8> {
        let (_, mut stream) = store.inner.get_object(key).await.unwrap();
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk.unwrap());
        }
        data
    }

    fn complete(key: &str, upload_id: &str, num_parts: i64) -> CompleteUploadCommand {
        CompleteUploadCommand {
            key: key.to_string(),
            upload_id: upload_id.to_string(),
            num_parts,
        }
    }

    #[test]
    fn test_start_upload_returns_session() {
        let handler = StartUploadHandler::new();
        let session = handler.handle(StartUploadCommand {
            file_size_bytes: 200 * 1024 * 1024,
        });
        assert_eq!(session.num_parts, 3);
        assert_eq!(session.upload_id.as_str().len(), 32);
    }

    #[tokio::test]
    async fn test_part_url_rejects_out_of_range() {
        let (_, gateway) = setup();
        let handler = GetPartUploadUrlHandler::new(gateway);

        for part_number in [-1, 32, 100] {
            let err = handler
                .handle(GetPartUploadUrlCommand {
                    upload_id: "abc".to_string(),
                    part_number,
                    num_parts: None,
                })
                .await
                .unwrap_err();
            assert!(matches!(err, ApplicationError::InvalidPartNumber { .. }));
        }
    }

    #[tokio::test]
    async fn test_part_url_bounded_by_session_parts() {
        let (_, gateway) = setup();
        let handler = GetPartUploadUrlHandler::new(gateway);

        let err = handler
            .handle(GetPartUploadUrlCommand {
                upload_id: "abc".to_string(),
                part_number: 2,
                num_parts: Some(2),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::InvalidPartNumber { value: 2, limit: 2 }
        ));
    }

    #[tokio::test]
    async fn test_part_url_rejects_invalid_session_parts() {
        let (store, gateway) = setup();
        let handler = GetPartUploadUrlHandler::new(gateway);

        for num_parts in [0, 33, 40] {
            let err = handler
                .handle(GetPartUploadUrlCommand {
                    upload_id: "abc".to_string(),
                    part_number: 0,
                    num_parts: Some(num_parts),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, ApplicationError::ValidationError(_)));
        }
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_part_url_signs_part_key() {
        let (_, gateway) = setup();
        let handler = GetPartUploadUrlHandler::new(gateway);

        let response = handler
            .handle(GetPartUploadUrlCommand {
                upload_id: "abc".to_string(),
                part_number: 3,
                num_parts: None,
            })
            .await
            .unwrap();
        assert!(response.url.starts_with("http://localhost:5060/storage/abc-part3?"));
        assert!(response.url.contains("method=PUT"));
        assert_eq!(response.expires_in_secs, 900);
    }

    #[tokio::test]
    async fn test_part_url_rejects_empty_upload_id() {
        let (_, gateway) = setup();
        let handler = GetPartUploadUrlHandler::new(gateway);
        let err = handler
            .handle(GetPartUploadUrlCommand {
                upload_id: String::new(),
                part_number: 0,
                num_parts: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_complete_composes_in_order_then_deletes_all() {
        let (store, gateway) = setup();
        upload_parts(&store, "up1", &[b"aaa", b"bbb", b"ccc"]).await;
        let handler = CompleteUploadHandler::new(gateway, 2);

        let report = handler.handle(complete("final.wav", "up1", 3)).await.unwrap();
        assert_eq!(report.num_parts, 3);
        assert!(report.orphaned_parts.is_empty());

        assert_eq!(
            store.calls_with_prefix("compose:"),
            vec!["compose:final.wav:up1-part0,up1-part1,up1-part2".to_string()]
        );
        assert_eq!(store.calls_with_prefix("delete:").len(), 3);
        assert_eq!(read_all(&store, "final.wav").await, b"aaabbbccc");
        assert_eq!(store.inner.head_object("up1-part1").await.unwrap(), ObjectHead::NotFound);
    }

    #[tokio::test]
    async fn test_complete_phases_run_in_order() {
        let (store, gateway) = setup();
        upload_parts(&store, "up2", &[b"a", b"b"]).await;
        let handler = CompleteUploadHandler::new(gateway, 8);
        handler.handle(complete("out", "up2", 2)).await.unwrap();

        let calls = store.calls();
        let kinds: Vec<&str> = calls.iter().map(|c| c.split(':').next().unwrap()).collect();
        assert_eq!(kinds, vec!["head", "head", "compose", "delete", "delete"]);
    }

    #[tokio::test]
    async fn test_complete_reports_first_missing_part() {
        let (store, gateway) = setup();
        // 只上传 part0 和 part3
        store.inner.put_object("up3-part0", Bytes::from_static(b"a")).await.unwrap();
        store.inner.put_object("up3-part3", Bytes::from_static(b"d")).await.unwrap();
        let handler = CompleteUploadHandler::new(gateway, 4);

        let err = handler.handle(complete("out", "up3", 4)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::PartMissing(1)));
        assert!(store.calls_with_prefix("compose:").is_empty());
        assert!(store.calls_with_prefix("delete:").is_empty());
    }

    #[tokio::test]
    async fn test_complete_swallows_delete_failures() {
        let (store, gateway) = setup();
        upload_parts(&store, "up4", &[b"1", b"2", b"3"]).await;
        store
            .fail_deletes
            .lock()
            .unwrap()
            .insert("up4-part1".to_string());
        let handler = CompleteUploadHandler::new(gateway, 3);

        let report = handler.handle(complete("merged", "up4", 3)).await.unwrap();
        assert_eq!(report.orphaned_parts, vec!["up4-part1".to_string()]);
        assert_eq!(store.calls_with_prefix("delete:").len(), 3);
        assert_eq!(read_all(&store, "merged").await, b"123");
    }

    #[tokio::test]
    async fn test_cleanup_respects_concurrency_limit() {
        let (store, gateway) = setup();
        let parts: Vec<&[u8]> = vec![&b"p"[..]; 8];
        upload_parts(&store, "up7", &parts).await;
        *store.delete_delay.lock().unwrap() = Some(Duration::from_millis(20));
        let handler = CompleteUploadHandler::new(gateway, 2);

        let report = handler.handle(complete("out", "up7", 8)).await.unwrap();
        assert!(report.orphaned_parts.is_empty());
        assert_eq!(store.calls_with_prefix("delete:").len(), 8);
        assert_eq!(store.max_deletes_in_flight.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cleanup_runs_sequentially_with_concurrency_one() {
        let (store, gateway) = setup();
        upload_parts(&store, "up8", &[b"a", b"b", b"c"]).await;
        *store.delete_delay.lock().unwrap() = Some(Duration::from_millis(5));
        let handler = CompleteUploadHandler::new(gateway, 0);

        handler.handle(complete("out", "up8", 3)).await.unwrap();
        assert_eq!(store.max_deletes_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_compose_failure_keeps_parts_for_retry() {
        let (store, gateway) = setup();
        upload_parts(&store, "up5", &[b"x", b"y"]).await;
        store.fail_compose.store(true, Ordering::SeqCst);
        let handler = CompleteUploadHandler::new(gateway, 2);

        let err = handler.handle(complete("out", "up5", 2)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ComposeError(_)));
        assert!(store.calls_with_prefix("delete:").is_empty());

        // 分片仍在，重试成功
        store.fail_compose.store(false, Ordering::SeqCst);
        let report = handler.handle(complete("out", "up5", 2)).await.unwrap();
        assert!(report.orphaned_parts.is_empty());
        assert_eq!(read_all(&store, "out").await, b"xy");
    }

    #[tokio::test]
    async fn test_complete_validates_before_storage_calls() {
        let (store, gateway) = setup();
        let handler = CompleteUploadHandler::new(gateway, 2);

        for num_parts in [0, -1, 33] {
            let err = handler.handle(complete("out", "up6", num_parts)).await.unwrap_err();
            assert!(matches!(err, ApplicationError::ValidationError(_)));
        }
        let err = handler.handle(complete("../etc", "up6", 1)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_download_url() {
        let (_, gateway) = setup();
        let handler = CreateDownloadUrlHandler::new(gateway);

        let response = handler
            .handle(CreateDownloadUrlCommand {
                key: "meetings/a.wav".to_string(),
            })
            .await
            .unwrap();
        assert!(response.url.contains("/storage/meetings/a.wav?"));
        assert!(response.url.contains("method=GET"));

        let err = handler
            .handle(CreateDownloadUrlCommand { key: String::new() })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
    }
}
