//! Fake Job Service - 进程内的推理任务服务
//!
//! 不调用远端服务，任务保存在内存中：
//! - `run` 接受任务并置为 IN_QUEUE
//! - `run_sync` 返回预设的状态与输出（默认 COMPLETED + 空转写）
//! - 状态以原始字符串保存，可以注入非法状态来演练协议错误
//!
//! 内存有上限：请求记录只保留最近的若干条；任务表满时先淘汰已终止的任务，
//! 仍然满则以 429 拒绝新任务。

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

use crate::application::ports::{
    EndpointHealth, JobServiceError, JobServicePort, JobSnapshot, JobSubmission, PurgeQueueResult,
    RunRequest,
};
use crate::domain::transcription::JobStatus;

/// 默认最多保留的任务数
const DEFAULT_MAX_JOBS: usize = 1024;

/// 默认最多保留的请求记录数
const DEFAULT_MAX_RECORDED_REQUESTS: usize = 64;

#[derive(Debug, Clone)]
struct FakeJob {
    status: String,
    output: Option<Value>,
}

/// Fake Job Service
pub struct FakeJobService {
    jobs: DashMap<String, FakeJob>,
    requests: Mutex<VecDeque<(String, Value)>>,
    sync_response: Mutex<Option<(JobStatus, Option<Value>)>>,
    max_jobs: usize,
    max_recorded_requests: usize,
}

impl FakeJobService {
    pub fn new() -> Self {
        tracing::info!("FakeJobService initialized");
        Self {
            jobs: DashMap::new(),
            requests: Mutex::new(VecDeque::new()),
            sync_response: Mutex::new(None),
            max_jobs: DEFAULT_MAX_JOBS,
            max_recorded_requests: DEFAULT_MAX_RECORDED_REQUESTS,
        }
    }

    /// 调整任务表和请求记录的上限
    pub fn with_limits(mut self, max_jobs: usize, max_recorded_requests: usize) -> Self {
        self.max_jobs = max_jobs.max(1);
        self.max_recorded_requests = max_recorded_requests;
        self
    }

    /// 预设 `run_sync` 的返回
    pub fn set_sync_response(&self, status: JobStatus, output: Option<Value>) {
        *self
            .sync_response
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some((status, output));
    }

    /// 直接写入一个任务，`status` 为原始状态字符串
    pub fn insert_job(&self, job_id: impl Into<String>, status: &str, output: Option<Value>) {
        self.jobs.insert(
            job_id.into(),
            FakeJob {
                status: status.to_string(),
                output,
            },
        );
    }

    /// 最近收到的请求 (endpoint, 请求体)，从旧到新
    pub fn recorded_requests(&self) -> Vec<(String, Value)> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    fn record(&self, endpoint: &str, request: &RunRequest) -> Result<(), JobServiceError> {
        if self.max_recorded_requests == 0 {
            return Ok(());
        }
        let body = serde_json::to_value(request)
            .map_err(|e| JobServiceError::InvalidRequest(e.to_string()))?;
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        while requests.len() >= self.max_recorded_requests {
            requests.pop_front();
        }
        requests.push_back((endpoint.to_string(), body));
        Ok(())
    }

    /// 为新任务腾出位置：先淘汰已终止的任务，仍然满则拒绝
    fn reserve_slot(&self) -> Result<(), JobServiceError> {
        if self.jobs.len() < self.max_jobs {
            return Ok(());
        }
        self.jobs.retain(|_, job| {
            !JobStatus::from_wire(&job.status).map_or(true, |status| status.is_terminal())
        });
        if self.jobs.len() >= self.max_jobs {
            tracing::warn!(max_jobs = self.max_jobs, "FakeJobService: job table full");
            return Err(JobServiceError::ServiceError {
                status: 429,
                body: format!("queue is full ({} jobs)", self.max_jobs),
            });
        }
        Ok(())
    }

    fn new_job_id() -> String {
        format!("fake-{}", Uuid::new_v4())
    }

    fn not_found(job_id: &str) -> JobServiceError {
        JobServiceError::ServiceError {
            status: 404,
            body: format!("job {} not found", job_id),
        }
    }

    /// 默认的同步输出：没有分片的空转写
    fn default_output(request: &RunRequest) -> Value {
        let model = request
            .input
            .get("model")
            .cloned()
            .unwrap_or_else(|| json!("base"));
        json!({
            "segments": [],
            "detected_language": "en",
            "transcription": "",
            "model": model
        })
    }
}

impl Default for FakeJobService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobServicePort for FakeJobService {
    async fn run(&self, endpoint: &str, request: &RunRequest) -> Result<JobSubmission, JobServiceError> {
        self.reserve_slot()?;
        self.record(endpoint, request)?;
        let job_id = Self::new_job_id();
        self.insert_job(job_id.clone(), JobStatus::Queued.as_wire(), None);
        tracing::debug!(job_id = %job_id, "FakeJobService: job queued");

        Ok(JobSubmission {
            job_id,
            status: JobStatus::Queued,
        })
    }

    async fn run_sync(&self, endpoint: &str, request: &RunRequest) -> Result<JobSnapshot, JobServiceError> {
        self.reserve_slot()?;
        self.record(endpoint, request)?;
        let (status, output) = self
            .sync_response
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .unwrap_or_else(|| (JobStatus::Completed, Some(Self::default_output(request))));

        let job_id = Self::new_job_id();
        self.insert_job(job_id.clone(), status.as_wire(), output.clone());

        Ok(JobSnapshot {
            job_id,
            status,
            delay_time_ms: 0,
            execution_time_ms: 0,
            output,
        })
    }

    async fn status(&self, _endpoint: &str, job_id: &str) -> Result<JobSnapshot, JobServiceError> {
        let job = self
            .jobs
            .get(job_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Self::not_found(job_id))?;

        Ok(JobSnapshot {
            job_id: job_id.to_string(),
            status: JobStatus::from_wire(&job.status)?,
            delay_time_ms: 0,
            execution_time_ms: 0,
            output: job.output,
        })
    }

    async fn cancel(&self, _endpoint: &str, job_id: &str) -> Result<JobSubmission, JobServiceError> {
        let mut job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| Self::not_found(job_id))?;

        let current = JobStatus::from_wire(&job.status)?;
        let status = if current.is_terminal() {
            current
        } else {
            job.status = JobStatus::Cancelled.as_wire().to_string();
            JobStatus::Cancelled
        };

        Ok(JobSubmission {
            job_id: job_id.to_string(),
            status,
        })
    }

    async fn health(&self, _endpoint: &str) -> Result<EndpointHealth, JobServiceError> {
        let mut health = EndpointHealth::default();
        for entry in self.jobs.iter() {
            match JobStatus::from_wire(&entry.value().status) {
                Ok(JobStatus::Queued) => health.jobs.in_queue += 1,
                Ok(JobStatus::Running) => health.jobs.in_progress += 1,
                Ok(JobStatus::Completed) => health.jobs.completed += 1,
                Ok(JobStatus::Failed) | Ok(JobStatus::TimedOut) => health.jobs.failed += 1,
                Ok(JobStatus::Cancelled) | Err(_) => {}
            }
        }
        health.workers.ready = 1;
        Ok(health)
    }

    async fn purge_queue(&self, _endpoint: &str) -> Result<PurgeQueueResult, JobServiceError> {
        let before = self.jobs.len();
        self.jobs
            .retain(|_, job| job.status != JobStatus::Queued.as_wire());
        let removed = (before - self.jobs.len()) as u64;

        Ok(PurgeQueueResult {
            removed,
            status: "completed".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_then_status() {
        let fake = FakeJobService::new();
        let request = RunRequest::new(json!({"audio": "u"}));
        let submission = fake.run("http://e", &request).await.unwrap();

        let snapshot = fake.status("http://e", &submission.job_id).await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Queued);
        assert_eq!(fake.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_default_sync_response_is_decodable() {
        let fake = FakeJobService::new();
        let request = RunRequest::new(json!({"audio": "u", "model": "small"}));
        let snapshot = fake.run_sync("http://e", &request).await.unwrap();

        assert_eq!(snapshot.status, JobStatus::Completed);
        let output = snapshot.output.unwrap();
        assert_eq!(output["model"], json!("small"));
        assert!(crate::domain::transcription::TranscriptionResult::decode(output).is_ok());
    }

    #[tokio::test]
    async fn test_recorded_requests_keep_only_latest() {
        let fake = FakeJobService::new().with_limits(16, 2);
        for audio in ["a", "b", "c"] {
            let request = RunRequest::new(json!({"audio": audio}));
            fake.run("http://e", &request).await.unwrap();
        }

        let requests = fake.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].1["input"]["audio"], json!("b"));
        assert_eq!(requests[1].1["input"]["audio"], json!("c"));
    }

    #[tokio::test]
    async fn test_full_job_table_evicts_terminal_jobs_then_rejects() {
        let fake = FakeJobService::new().with_limits(2, 0);
        let request = RunRequest::new(json!({"audio": "u"}));

        fake.insert_job("done", "COMPLETED", None);
        fake.run("http://e", &request).await.unwrap();
        // 已完成的任务被淘汰，给新任务腾出位置
        fake.run("http://e", &request).await.unwrap();
        assert!(matches!(
            fake.status("http://e", "done").await,
            Err(JobServiceError::ServiceError { status: 404, .. })
        ));

        // 两个任务都在排队，无可淘汰
        let err = fake.run("http://e", &request).await.unwrap_err();
        assert!(matches!(err, JobServiceError::ServiceError { status: 429, .. }));
        assert!(fake.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_terminal_job_keeps_status() {
        let fake = FakeJobService::new();
        fake.insert_job("done", "COMPLETED", None);
        let submission = fake.cancel("http://e", "done").await.unwrap();
        assert_eq!(submission.status, JobStatus::Completed);
    }
}
