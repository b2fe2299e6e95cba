//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 对象存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 推理服务配置
    #[serde(default)]
    pub inference: InferenceConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL，签名 URL 以此为前缀
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

/// 对象存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::File => write!(f, "file"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// 对象存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// 文件后端根目录
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// 签名密钥，为空时所有签名请求失败
    #[serde(default)]
    pub signing_secret: String,

    /// 签名 URL 有效期（秒）
    #[serde(default = "default_url_ttl")]
    pub url_ttl_secs: u64,

    /// 单个对象（单次 PUT）的最大字节数
    #[serde(default = "default_max_object_bytes")]
    pub max_object_bytes: u64,

    /// 合并后删除分片的最大并发数
    #[serde(default = "default_cleanup_concurrency")]
    pub cleanup_concurrency: usize,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("data/storage")
}

fn default_url_ttl() -> u64 {
    900 // 15 分钟
}

/// 单个对象（单次 PUT）的默认上限，HTTP 请求体上限与之一致
pub const DEFAULT_MAX_OBJECT_BYTES: u64 = 256 * 1024 * 1024;

fn default_max_object_bytes() -> u64 {
    DEFAULT_MAX_OBJECT_BYTES
}

fn default_cleanup_concurrency() -> usize {
    8
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root_dir: default_root_dir(),
            signing_secret: String::new(),
            url_ttl_secs: default_url_ttl(),
            max_object_bytes: default_max_object_bytes(),
            cleanup_concurrency: default_cleanup_concurrency(),
        }
    }
}

impl StorageConfig {
    pub fn url_ttl(&self) -> Duration {
        Duration::from_secs(self.url_ttl_secs)
    }
}

/// 推理服务后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceBackend {
    #[default]
    Runpod,
    /// 进程内假服务，本地开发用
    Fake,
}

impl std::fmt::Display for InferenceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceBackend::Runpod => write!(f, "runpod"),
            InferenceBackend::Fake => write!(f, "fake"),
        }
    }
}

/// 推理服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    #[serde(default)]
    pub backend: InferenceBackend,

    /// 转写 endpoint 基础 URL，如 https://api.runpod.ai/v2/{endpoint_id}
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_inference_timeout")]
    pub timeout_secs: u64,
}

fn default_inference_timeout() -> u64 {
    120
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: InferenceBackend::default(),
            endpoint: String::new(),
            api_key: String::new(),
            timeout_secs: default_inference_timeout(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别，RUST_LOG 优先
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_base_url() {
        let mut server = ServerConfig::default();
        assert_eq!(server.public_base_url(), "http://localhost:5060");

        server.host = "10.0.0.2".to_string();
        assert_eq!(server.public_base_url(), "http://10.0.0.2:5060");

        server.base_url = Some("https://media.example.com".to_string());
        assert_eq!(server.public_base_url(), "https://media.example.com");
    }

    #[test]
    fn test_storage_defaults() {
        let storage = StorageConfig::default();
        assert_eq!(storage.backend, StorageBackend::File);
        assert_eq!(storage.url_ttl(), Duration::from_secs(900));
        assert_eq!(storage.cleanup_concurrency, 8);
        assert_eq!(storage.max_object_bytes, DEFAULT_MAX_OBJECT_BYTES);
    }
}
