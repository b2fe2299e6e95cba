//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, InferenceBackend, StorageBackend, DEFAULT_MAX_OBJECT_BYTES};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `SCRIBELINE_SERVER__PORT=8080`
/// - `SCRIBELINE_SERVER__BASE_URL=https://media.example.com`
/// - `SCRIBELINE_STORAGE__BACKEND=memory`
/// - `SCRIBELINE_STORAGE__SIGNING_SECRET=...`
/// - `SCRIBELINE_INFERENCE__ENDPOINT=https://api.runpod.ai/v2/abc123`
/// - `SCRIBELINE_INFERENCE__API_KEY=...`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5060)?
        .set_default("storage.backend", "file")?
        .set_default("storage.root_dir", "data/storage")?
        .set_default("storage.url_ttl_secs", 900)?
        .set_default("storage.max_object_bytes", DEFAULT_MAX_OBJECT_BYTES)?
        .set_default("storage.cleanup_concurrency", 8)?
        .set_default("inference.backend", "runpod")?
        .set_default("inference.timeout_secs", 120)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 前缀: SCRIBELINE_，层级分隔符: __
    builder = builder.add_source(
        Environment::with_prefix("SCRIBELINE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.storage.url_ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Signed URL TTL cannot be 0".to_string(),
        ));
    }

    if config.storage.cleanup_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "Cleanup concurrency cannot be 0".to_string(),
        ));
    }

    if config.storage.backend == StorageBackend::File
        && config.storage.root_dir.as_os_str().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "Storage root_dir cannot be empty for the file backend".to_string(),
        ));
    }

    if config.inference.backend == InferenceBackend::Runpod {
        if config.inference.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Inference endpoint cannot be empty".to_string(),
            ));
        }
        if config.inference.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Inference API key cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志），密钥只输出是否已设置
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("Storage Backend: {}", config.storage.backend);
    if config.storage.backend == StorageBackend::File {
        tracing::info!("Storage Root: {:?}", config.storage.root_dir);
    }
    tracing::info!("Signed URL TTL: {}s", config.storage.url_ttl_secs);
    tracing::info!("Max Object Size: {} bytes", config.storage.max_object_bytes);
    tracing::info!("Cleanup Concurrency: {}", config.storage.cleanup_concurrency);
    if config.storage.signing_secret.is_empty() {
        tracing::warn!("Signing secret is not set, signed URL requests will fail");
    }
    tracing::info!("Inference Backend: {}", config.inference.backend);
    if config.inference.backend == InferenceBackend::Runpod {
        tracing::info!("Inference Endpoint: {}", config.inference.endpoint);
        tracing::info!("Inference Timeout: {}s", config.inference.timeout_secs);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.inference.endpoint = "https://api.example.com/v2/whisper".to_string();
        config.inference.api_key = "key".to_string();
        config
    }

    #[test]
    fn test_load_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5060);
        assert_eq!(config.storage.url_ttl_secs, 900);
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_ttl_and_concurrency() {
        let mut config = valid_config();
        config.storage.url_ttl_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.storage.cleanup_concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_runpod_requires_endpoint_and_key() {
        let mut config = valid_config();
        config.inference.api_key = String::new();
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.inference.endpoint = " ".to_string();
        assert!(validate_config(&config).is_err());

        // fake 后端不需要凭据
        let mut config = AppConfig::default();
        config.inference.backend = InferenceBackend::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_file_backend_requires_root_dir() {
        let mut config = valid_config();
        config.storage.root_dir = Default::default();
        assert!(validate_config(&config).is_err());

        config.storage.backend = StorageBackend::Memory;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 7070
base_url = "https://media.example.com"

[storage]
backend = "memory"
signing_secret = "s3cret"
cleanup_concurrency = 2

[inference]
backend = "fake"
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 7070);
        assert_eq!(config.server.public_base_url(), "https://media.example.com");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.cleanup_concurrency, 2);
        assert_eq!(config.storage.url_ttl_secs, 900);
        assert_eq!(config.storage.max_object_bytes, DEFAULT_MAX_OBJECT_BYTES);
        assert_eq!(config.inference.backend, InferenceBackend::Fake);
        assert_eq!(config.inference.timeout_secs, 120);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[storage]\nbackend = \"s3\"\n[inference]\nbackend = \"fake\"").unwrap();

        let err = load_config_from_path(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
