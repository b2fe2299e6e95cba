//! Upload Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("part number must be in [0, {limit}), got {value}")]
    InvalidPartNumber { value: i64, limit: u32 },

    #[error("invalid upload id: {0}")]
    InvalidUploadId(String),

    #[error("invalid object key: {0}")]
    InvalidObjectKey(String),

    #[error("number of parts must be between 1 and 32, got {0}")]
    InvalidNumParts(i64),
}
