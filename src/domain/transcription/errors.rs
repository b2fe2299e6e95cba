//! Transcription Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptionError {
    #[error("empty status received")]
    EmptyStatus,

    #[error("unexpected status received: {0}")]
    UnexpectedStatus(String),

    #[error("failed to decode transcription output: {0}")]
    Decode(String),
}
