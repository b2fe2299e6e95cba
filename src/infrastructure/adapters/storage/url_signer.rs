//! URL Signer - 签名 URL 生成与校验
//!
//! 本地后端自带数据面，签名 URL 指向本服务的 `/storage/{key}`：
//!
//! ```text
//! {base_url}/storage/{key}?method=PUT&expires=1700000000&signature=<hex>
//! ```
//!
//! 签名为 keyed BLAKE3，输入为规范串 `"{METHOD}\n{key}\n{expires}"`，
//! 密钥由配置中的 secret 派生。

use chrono::Utc;
use std::time::Duration;
use thiserror::Error;

use crate::application::ports::{ObjectStoreError, SignedMethod};

/// 密钥派生上下文
const SIGNING_CONTEXT: &str = "scribeline 2024-06 signed storage url v1";

/// 签名校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signing secret not configured")]
    NoCredentials,

    #[error("malformed signature")]
    Malformed,

    #[error("signature mismatch")]
    Mismatch,

    #[error("signed URL expired at {0}")]
    Expired(i64),
}

/// 签名 URL 生成器
#[derive(Clone)]
pub struct UrlSigner {
    base_url: String,
    key: Option<[u8; 32]>,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .field("has_key", &self.key.is_some())
            .finish()
    }
}

impl UrlSigner {
    /// 创建签名器；空 secret 表示凭据缺失，签名时返回 Credential 错误
    pub fn new(base_url: impl Into<String>, secret: &str) -> Self {
        let key = if secret.is_empty() {
            None
        } else {
            Some(blake3::derive_key(SIGNING_CONTEXT, secret.as_bytes()))
        };
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn canonical(method: SignedMethod, key: &str, expires: i64) -> String {
        format!("{}\n{}\n{}", method.as_str(), key, expires)
    }

    fn digest(&self, method: SignedMethod, key: &str, expires: i64) -> Option<blake3::Hash> {
        self.key.as_ref().map(|secret| {
            blake3::keyed_hash(secret, Self::canonical(method, key, expires).as_bytes())
        })
    }

    /// 签发自当前时刻起 `ttl` 内有效的 URL
    pub fn sign(
        &self,
        method: SignedMethod,
        key: &str,
        ttl: Duration,
    ) -> Result<String, ObjectStoreError> {
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        self.sign_until(method, key, expires)
    }

    /// 签发在 `expires`（unix 秒）之前有效的 URL
    pub fn sign_until(
        &self,
        method: SignedMethod,
        key: &str,
        expires: i64,
    ) -> Result<String, ObjectStoreError> {
        let digest = self.digest(method, key, expires).ok_or_else(|| {
            ObjectStoreError::Credential("signing secret is not configured".to_string())
        })?;

        Ok(format!(
            "{}/storage/{}?method={}&expires={}&signature={}",
            self.base_url,
            key,
            method.as_str(),
            expires,
            digest.to_hex()
        ))
    }

    /// 校验签名与有效期
    pub fn verify(
        &self,
        method: SignedMethod,
        key: &str,
        expires: i64,
        signature: &str,
    ) -> Result<(), SignatureError> {
        self.verify_at(method, key, expires, signature, Utc::now().timestamp())
    }

    pub fn verify_at(
        &self,
        method: SignedMethod,
        key: &str,
        expires: i64,
        signature: &str,
        now: i64,
    ) -> Result<(), SignatureError> {
        let expected = self
            .digest(method, key, expires)
            .ok_or(SignatureError::NoCredentials)?;

        let bytes: [u8; 32] = hex::decode(signature)
            .map_err(|_| SignatureError::Malformed)?
            .try_into()
            .map_err(|_| SignatureError::Malformed)?;

        // blake3::Hash 的比较是常量时间的
        if blake3::Hash::from(bytes) != expected {
            return Err(SignatureError::Mismatch);
        }
        if now >= expires {
            return Err(SignatureError::Expired(expires));
        }
        Ok(())
    }
}
