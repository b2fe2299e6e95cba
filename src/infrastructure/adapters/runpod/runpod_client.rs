//! RunPod Job Client - 调用 serverless 推理 endpoint
//!
//! 实现 JobServicePort trait
//!
//! Endpoint API（`{endpoint}` 为 endpoint 基础 URL）:
//! - POST `{endpoint}/run`          → `{"id", "status"}`
//! - POST `{endpoint}/runsync`      → `{"id", "status", "delayTime", "executionTime", "output"}`
//! - GET  `{endpoint}/status/{id}`  → 同 runsync
//! - POST `{endpoint}/cancel/{id}`  → `{"id", "status"}`
//! - GET  `{endpoint}/health`       → `{"jobs": {...}, "workers": {...}}`
//! - POST `{endpoint}/purge-queue`  → `{"removed", "status"}`
//!
//! 所有请求携带 `Authorization: Bearer {api_key}`

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::application::ports::{
    EndpointHealth, JobServiceError, JobServicePort, JobSnapshot, JobSubmission, PurgeQueueResult,
    RunRequest,
};
use crate::domain::transcription::{is_valid_job_id, JobStatus};

/// `/run`、`/cancel` 响应
#[derive(Debug, Deserialize)]
struct WireSubmission {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
}

impl WireSubmission {
    fn into_submission(self) -> Result<JobSubmission, JobServiceError> {
        Ok(JobSubmission {
            status: JobStatus::from_wire(&self.status)?,
            job_id: self.id,
        })
    }
}

/// `/runsync`、`/status` 响应
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSnapshot {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    delay_time: u64,
    #[serde(default)]
    execution_time: u64,
    #[serde(default)]
    output: Option<Value>,
}

impl WireSnapshot {
    fn into_snapshot(self) -> Result<JobSnapshot, JobServiceError> {
        let status = JobStatus::from_wire(&self.status).map_err(|e| {
            tracing::error!(job_id = %self.id, status = %self.status, "Unexpected job status received");
            e
        })?;
        Ok(JobSnapshot {
            job_id: self.id,
            status,
            delay_time_ms: self.delay_time,
            execution_time_ms: self.execution_time,
            output: self.output,
        })
    }
}

/// RunPod 客户端配置
#[derive(Debug, Clone)]
pub struct RunpodClientConfig {
    /// API key，不能为空
    pub api_key: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl RunpodClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            timeout_secs: 120,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// RunPod 任务客户端
pub struct RunpodJobClient {
    client: Client,
    api_key: String,
}

impl RunpodJobClient {
    /// 创建客户端，API key 为空时直接失败
    pub fn new(config: RunpodClientConfig) -> Result<Self, JobServiceError> {
        if config.api_key.trim().is_empty() {
            return Err(JobServiceError::Configuration(
                "inference API key is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| JobServiceError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key,
        })
    }

    fn url(endpoint: &str, path: &str) -> Result<String, JobServiceError> {
        let endpoint = endpoint.trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(JobServiceError::Configuration(
                "inference endpoint is not set".to_string(),
            ));
        }
        Ok(format!("{}/{}", endpoint, path))
    }

    /// `{endpoint}/{action}/{job_id}`，job id 必须是单个安全的路径段
    fn job_url(endpoint: &str, action: &str, job_id: &str) -> Result<String, JobServiceError> {
        if !is_valid_job_id(job_id) {
            return Err(JobServiceError::InvalidRequest(format!(
                "invalid job id: {:?}",
                job_id
            )));
        }
        Self::url(endpoint, &format!("{}/{}", action, job_id))
    }

    /// 发送请求并解析 JSON 响应体
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<T, JobServiceError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    JobServiceError::Timeout
                } else if e.is_connect() {
                    JobServiceError::NetworkError(format!(
                        "Cannot connect to inference service: {}",
                        e
                    ))
                } else {
                    JobServiceError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                JobServiceError::Timeout
            } else {
                JobServiceError::NetworkError(e.to_string())
            }
        })?;

        if !status.is_success() {
            tracing::warn!(operation, status = status.as_u16(), "Inference service returned error");
            return Err(JobServiceError::ServiceError {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(operation, error = %e, "Failed to parse inference service response");
            JobServiceError::InvalidResponse(format!("{}: {}", operation, e))
        })
    }
}

#[async_trait]
impl JobServicePort for RunpodJobClient {
    async fn run(&self, endpoint: &str, request: &RunRequest) -> Result<JobSubmission, JobServiceError> {
        let url = Self::url(endpoint, "run")?;
        tracing::info!(url = %url, "Running job");

        let wire: WireSubmission = self.send(self.client.post(&url).json(request), "run").await?;
        let submission = wire.into_submission()?;
        tracing::info!(job_id = %submission.job_id, status = %submission.status, "Job submitted");
        Ok(submission)
    }

    async fn run_sync(&self, endpoint: &str, request: &RunRequest) -> Result<JobSnapshot, JobServiceError> {
        let url = Self::url(endpoint, "runsync")?;
        tracing::info!(url = %url, "Running job synchronously");

        let wire: WireSnapshot = self
            .send(self.client.post(&url).json(request), "runsync")
            .await?;
        let snapshot = wire.into_snapshot()?;
        tracing::info!(
            job_id = %snapshot.job_id,
            status = %snapshot.status,
            delay_time_ms = snapshot.delay_time_ms,
            execution_time_ms = snapshot.execution_time_ms,
            "Synchronous job returned"
        );
        Ok(snapshot)
    }

    async fn status(&self, endpoint: &str, job_id: &str) -> Result<JobSnapshot, JobServiceError> {
        let url = Self::job_url(endpoint, "status", job_id)?;
        tracing::debug!(url = %url, "Getting job status");

        let wire: WireSnapshot = self.send(self.client.get(&url), "status").await?;
        wire.into_snapshot()
    }

    async fn cancel(&self, endpoint: &str, job_id: &str) -> Result<JobSubmission, JobServiceError> {
        let url = Self::job_url(endpoint, "cancel", job_id)?;
        tracing::info!(url = %url, "Cancelling job");

        let wire: WireSubmission = self.send(self.client.post(&url), "cancel").await?;
        wire.into_submission()
    }

    async fn health(&self, endpoint: &str) -> Result<EndpointHealth, JobServiceError> {
        let url = Self::url(endpoint, "health")?;
        self.send(self.client.get(&url), "health").await
    }

    async fn purge_queue(&self, endpoint: &str) -> Result<PurgeQueueResult, JobServiceError> {
        let url = Self::url(endpoint, "purge-queue")?;
        tracing::info!(url = %url, "Purging queue");

        let result: PurgeQueueResult = self.send(self.client.post(&url), "purge-queue").await?;
        tracing::info!(removed = result.removed, status = %result.status, "Queue purged");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const API_KEY: &str = "test-key";

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v == format!("Bearer {}", API_KEY))
    }

    async fn run(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
        if body["input"]["audio"].is_null() || body.get("webhook").is_some() {
            return (StatusCode::BAD_REQUEST, "bad envelope").into_response();
        }
        Json(json!({"id": "job-1", "status": "IN_QUEUE"})).into_response()
    }

    async fn runsync(headers: HeaderMap) -> impl IntoResponse {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
        Json(json!({
            "id": "job-2",
            "status": "COMPLETED",
            "delayTime": 12,
            "executionTime": 340,
            "output": {"segments": [], "detected_language": "en", "model": "tiny"}
        }))
        .into_response()
    }

    async fn status(Path(job_id): Path<String>) -> impl IntoResponse {
        match job_id.as_str() {
            "missing" => (StatusCode::NOT_FOUND, "job not found").into_response(),
            "empty" => Json(json!({"id": job_id, "status": ""})).into_response(),
            "bogus" => Json(json!({"id": job_id, "status": "BOGUS"})).into_response(),
            "garbage" => "not json".into_response(),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"id": job_id, "status": "IN_QUEUE"})).into_response()
            }
            _ => Json(json!({"id": job_id, "status": "IN_PROGRESS", "delayTime": 5}))
                .into_response(),
        }
    }

    async fn cancel(Path(job_id): Path<String>) -> Json<Value> {
        Json(json!({"id": job_id, "status": "CANCELLED"}))
    }

    async fn health() -> Json<Value> {
        Json(json!({
            "jobs": {"completed": 4, "failed": 1, "inProgress": 2, "inQueue": 3, "retried": 0},
            "workers": {"idle": 1, "running": 2}
        }))
    }

    async fn purge() -> Json<Value> {
        Json(json!({"removed": 3, "status": "completed"}))
    }

    /// 启动本地假 endpoint，返回基础 URL
    async fn spawn_endpoint() -> String {
        let app = Router::new()
            .route("/v2/whisper/run", post(run))
            .route("/v2/whisper/runsync", post(runsync))
            .route("/v2/whisper/status/:job_id", get(status))
            .route("/v2/whisper/cancel/:job_id", post(cancel))
            .route("/v2/whisper/health", get(health))
            .route("/v2/whisper/purge-queue", post(purge));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v2/whisper", addr)
    }

    fn client() -> RunpodJobClient {
        RunpodJobClient::new(RunpodClientConfig::new(API_KEY).with_timeout(1)).unwrap()
    }

    #[test]
    fn test_empty_api_key_is_configuration_error() {
        let err = RunpodJobClient::new(RunpodClientConfig::new("  ")).err().unwrap();
        assert!(matches!(err, JobServiceError::Configuration(_)));
    }

    #[test]
    fn test_config_builder() {
        let config = RunpodClientConfig::new("k").with_timeout(30);
        assert_eq!(config.api_key, "k");
        assert_eq!(config.timeout_secs, 30);
    }

    #[tokio::test]
    async fn test_run_sends_bearer_and_envelope() {
        let endpoint = spawn_endpoint().await;
        let request = RunRequest::new(json!({"audio": "https://a/b.wav"}));

        let submission = client().run(&endpoint, &request).await.unwrap();
        assert_eq!(submission.job_id, "job-1");
        assert_eq!(submission.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_wrong_key_is_service_error() {
        let endpoint = spawn_endpoint().await;
        let client = RunpodJobClient::new(RunpodClientConfig::new("other")).unwrap();
        let request = RunRequest::new(json!({"audio": "u"}));

        let err = client.run(&endpoint, &request).await.unwrap_err();
        assert!(matches!(err, JobServiceError::ServiceError { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_run_sync_snapshot() {
        let endpoint = spawn_endpoint().await;
        let request = RunRequest::new(json!({"audio": "u"}));

        let snapshot = client().run_sync(&endpoint, &request).await.unwrap();
        assert_eq!(snapshot.job_id, "job-2");
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.delay_time_ms, 12);
        assert_eq!(snapshot.execution_time_ms, 340);
        assert!(snapshot.output.is_some());
    }

    #[tokio::test]
    async fn test_status_variants() {
        let endpoint = spawn_endpoint().await;
        let client = client();

        let snapshot = client.status(&endpoint, "job-9").await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Running);
        assert_eq!(snapshot.delay_time_ms, 5);
        assert!(snapshot.output.is_none());

        assert!(matches!(
            client.status(&endpoint, "empty").await,
            Err(JobServiceError::EmptyStatus)
        ));
        match client.status(&endpoint, "bogus").await {
            Err(JobServiceError::UnexpectedStatus(value)) => assert_eq!(value, "BOGUS"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            client.status(&endpoint, "missing").await,
            Err(JobServiceError::ServiceError { status: 404, .. })
        ));
        assert!(matches!(
            client.status(&endpoint, "garbage").await,
            Err(JobServiceError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_status_timeout() {
        let endpoint = spawn_endpoint().await;
        let err = client().status(&endpoint, "slow").await.unwrap_err();
        assert!(matches!(err, JobServiceError::Timeout));
    }

    #[tokio::test]
    async fn test_cancel_health_purge() {
        let endpoint = spawn_endpoint().await;
        let client = client();

        let cancelled = client.cancel(&endpoint, "job-3").await.unwrap();
        assert_eq!(cancelled.status, JobStatus::Cancelled);

        let health = client.health(&endpoint).await.unwrap();
        assert_eq!(health.jobs.in_queue, 3);
        assert_eq!(health.jobs.in_progress, 2);
        assert_eq!(health.workers.running, 2);
        assert_eq!(health.workers.throttled, 0);

        let purged = client.purge_queue(&endpoint).await.unwrap();
        assert_eq!(purged.removed, 3);
        assert_eq!(purged.status, "completed");
    }

    #[tokio::test]
    async fn test_job_id_cannot_escape_its_path_segment() {
        let purge_hits = Arc::new(AtomicUsize::new(0));
        let hits = purge_hits.clone();
        let app = Router::new()
            .route("/v2/w/cancel/:job_id", post(cancel))
            .route("/v2/w/status/:job_id", get(status))
            .route(
                "/v2/w/purge-queue",
                post(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(json!({"removed": 1, "status": "completed"}))
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let endpoint = format!("http://{}/v2/w", addr);
        let client = client();

        for job_id in ["../purge-queue", "x/../../purge-queue", "job?id=1", ""] {
            assert!(matches!(
                client.cancel(&endpoint, job_id).await,
                Err(JobServiceError::InvalidRequest(_))
            ));
            assert!(matches!(
                client.status(&endpoint, job_id).await,
                Err(JobServiceError::InvalidRequest(_))
            ));
        }
        assert_eq!(purge_hits.load(Ordering::SeqCst), 0);

        let cancelled = client.cancel(&endpoint, "job_7-a").await.unwrap();
        assert_eq!(cancelled.job_id, "job_7-a");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let err = client()
            .health("http://127.0.0.1:1")
            .await
            .unwrap_err();
        assert!(matches!(err, JobServiceError::NetworkError(_)));
    }

    #[tokio::test]
    async fn test_empty_endpoint_is_configuration_error() {
        let err = client().health("").await.unwrap_err();
        assert!(matches!(err, JobServiceError::Configuration(_)));
    }
}
