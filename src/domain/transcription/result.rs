//! Transcription Context - 转写结果

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{JobStatus, TranscriptionError};

/// 带时间戳的转写片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub seek: u64,
    /// 起始时间（秒）
    pub start: f64,
    /// 结束时间（秒）
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub tokens: Vec<i64>,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub avg_logprob: f64,
    #[serde(default)]
    pub compression_ratio: f64,
    #[serde(default)]
    pub no_speech_prob: f64,
}

/// 已完成任务的输出
///
/// `segments`、`detected_language`、`model` 为必需字段，缺失即视为解码失败。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub segments: Vec<TranscriptSegment>,
    pub detected_language: String,
    #[serde(default)]
    pub transcription: String,
    #[serde(default)]
    pub translation: Option<Value>,
    #[serde(default)]
    pub device: String,
    pub model: String,
    #[serde(default)]
    pub translation_time: f64,
}

impl TranscriptionResult {
    /// 从远端输出解码，只解码一次
    pub fn decode(output: Value) -> Result<Self, TranscriptionError> {
        serde_json::from_value(output).map_err(|e| TranscriptionError::Decode(e.to_string()))
    }

    /// 拼接全部片段文本
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 面向调用方的任务结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TranscriptionOutcome {
    /// 仍在排队或处理中，调用方稍后重试
    InProgress { status: JobStatus },
    Completed { output: TranscriptionResult },
    /// 终止但未成功（FAILED / CANCELLED / TIMED_OUT）
    Failed { status: JobStatus },
}

impl TranscriptionOutcome {
    /// 把远端状态和输出映射为结果
    pub fn resolve(status: JobStatus, output: Option<Value>) -> Result<Self, TranscriptionError> {
        match status {
            JobStatus::Queued | JobStatus::Running => Ok(Self::InProgress { status }),
            JobStatus::Completed => {
                let output = match output {
                    Some(Value::Null) | None => {
                        return Err(TranscriptionError::Decode(
                            "completed job has no output".to_string(),
                        ))
                    }
                    Some(value) => value,
                };
                Ok(Self::Completed {
                    output: TranscriptionResult::decode(output)?,
                })
            }
            JobStatus::Failed | JobStatus::Cancelled | JobStatus::TimedOut => {
                Ok(Self::Failed { status })
            }
        }
    }

    /// 结果对应的远端状态
    pub fn status(&self) -> JobStatus {
        match self {
            Self::InProgress { status } | Self::Failed { status } => *status,
            Self::Completed { .. } => JobStatus::Completed,
        }
    }
}
