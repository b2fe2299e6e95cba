//! Upload Context - Value Objects

use serde::{Deserialize, Serialize};

use super::{UploadError, MAX_PARTS};

/// Upload ID 最大长度
const MAX_UPLOAD_ID_LEN: usize = 128;

/// 对象 key 最大长度（字节）
const MAX_OBJECT_KEY_LEN: usize = 1024;

/// 分片上传会话标识
///
/// 128 bit 随机数的小写十六进制编码，服务端不保存任何状态，
/// 后续请求由调用方回传。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadId(String);

impl UploadId {
    /// 生成新的随机 Upload ID
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(hex::encode(bytes))
    }

    /// 校验调用方回传的 Upload ID
    ///
    /// 只接受 ASCII 字母数字和 `-`，保证派生出的分片 key 合法。
    pub fn parse(value: impl Into<String>) -> Result<Self, UploadError> {
        let value = value.into();
        if value.is_empty() {
            return Err(UploadError::InvalidUploadId("upload id is empty".to_string()));
        }
        if value.len() > MAX_UPLOAD_ID_LEN {
            return Err(UploadError::InvalidUploadId(format!(
                "upload id exceeds {} characters",
                MAX_UPLOAD_ID_LEN
            )));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(UploadError::InvalidUploadId(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 分片序号，取值范围 `[0, 32)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartNumber(u32);

impl PartNumber {
    /// 校验分片序号，越界直接报错，不做截断
    pub fn new(value: i64) -> Result<Self, UploadError> {
        Self::bounded(value, MAX_PARTS)
    }

    /// 按会话的分片数量进一步收紧上界（上界不会超过 32）
    pub fn bounded(value: i64, num_parts: u32) -> Result<Self, UploadError> {
        let limit = num_parts.min(MAX_PARTS);
        if value < 0 || value >= i64::from(limit) {
            return Err(UploadError::InvalidPartNumber { value, limit });
        }
        Ok(Self(value as u32))
    }

    /// 遍历 `[0, num_parts)` 的全部分片序号
    pub fn range(num_parts: u32) -> impl Iterator<Item = PartNumber> {
        (0..num_parts.min(MAX_PARTS)).map(PartNumber)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PartNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 分片对象 key: `{uploadId}-part{partNumber}`，序号不补零
pub fn part_key(upload_id: &UploadId, part_number: PartNumber) -> String {
    format!("{}-part{}", upload_id, part_number)
}

/// 对象存储 key
///
/// 允许的字符: ASCII 字母数字、`.`、`_`、`-`、`/`。
/// 不允许以 `/` 开头、空路径段以及 `.` / `..` 路径段，
/// 这样 key 既能直接放进 URL 路径，也能安全映射到本地文件路径。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn parse(value: impl Into<String>) -> Result<Self, UploadError> {
        let value = value.into();
        if value.is_empty() {
            return Err(UploadError::InvalidObjectKey("key is empty".to_string()));
        }
        if value.len() > MAX_OBJECT_KEY_LEN {
            return Err(UploadError::InvalidObjectKey(format!(
                "key exceeds {} bytes",
                MAX_OBJECT_KEY_LEN
            )));
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/');
        if !value.chars().all(allowed) {
            return Err(UploadError::InvalidObjectKey(format!(
                "key contains unsupported characters: {}",
                value
            )));
        }
        if value
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(UploadError::InvalidObjectKey(format!(
                "key has an empty or relative path segment: {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_upload_id_is_128_bit_hex() {
        let id = UploadId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, UploadId::generate());
    }

    #[test]
    fn test_upload_id_rejects_empty_and_odd_chars() {
        assert!(UploadId::parse("").is_err());
        assert!(UploadId::parse("abc/def").is_err());
        assert!(UploadId::parse("abc def").is_err());
        assert!(UploadId::parse("0f3a-99").is_ok());
    }

    #[test]
    fn test_part_number_bounds() {
        assert!(PartNumber::new(0).is_ok());
        assert!(PartNumber::new(31).is_ok());
        assert_eq!(
            PartNumber::new(32),
            Err(UploadError::InvalidPartNumber { value: 32, limit: 32 })
        );
        assert_eq!(
            PartNumber::new(-1),
            Err(UploadError::InvalidPartNumber { value: -1, limit: 32 })
        );
    }

    #[test]
    fn test_part_number_bounded_by_session() {
        assert!(PartNumber::bounded(2, 3).is_ok());
        assert!(PartNumber::bounded(3, 3).is_err());
        // 会话分片数不会放宽 32 的上限
        assert!(PartNumber::bounded(40, 100).is_err());
    }

    #[test]
    fn test_part_key_format() {
        let id = UploadId::parse("abc123").unwrap();
        let key = part_key(&id, PartNumber::new(7).unwrap());
        assert_eq!(key, "abc123-part7");
    }

    #[test]
    fn test_part_key_is_injective_per_upload() {
        let id = UploadId::generate();
        let keys: HashSet<String> = PartNumber::range(32).map(|n| part_key(&id, n)).collect();
        assert_eq!(keys.len(), 32);
    }

    #[test]
    fn test_object_key_validation() {
        assert!(ObjectKey::parse("meetings/2024/standup.wav").is_ok());
        assert!(ObjectKey::parse("").is_err());
        assert!(ObjectKey::parse("/abs/path").is_err());
        assert!(ObjectKey::parse("a/../b").is_err());
        assert!(ObjectKey::parse("a//b").is_err());
        assert!(ObjectKey::parse("a?b").is_err());
        assert!(ObjectKey::parse("trailing/").is_err());
    }
}
