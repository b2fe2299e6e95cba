//! Transcription Context - 转写任务限界上下文
//!
//! 职责:
//! - 远程任务状态（与服务端协议一致的六种取值）
//! - 转写参数（带默认值的配置对象）
//! - 转写结果解码与任务结果判定

mod errors;
mod input;
mod job_status;
mod result;

pub use errors::TranscriptionError;
pub use input::{TranscriptionFormat, TranscriptionInput, WhisperModel};
pub use job_status::{is_valid_job_id, JobStatus, MAX_JOB_ID_LEN};
pub use result::{TranscriptSegment, TranscriptionOutcome, TranscriptionResult};
