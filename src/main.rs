//! Scribeline - 分片上传协调 + 远程转写任务网关

use std::sync::Arc;

use scribeline::application::{JobServicePort, ObjectDataPort, ObjectStoragePort};
use scribeline::config::{load_config, print_config, InferenceBackend, LogConfig, StorageBackend};
use scribeline::infrastructure::adapters::{
    FakeJobService, FileObjectStore, MemoryObjectStore, RunpodClientConfig, RunpodJobClient,
    UrlSigner,
};
use scribeline::infrastructure::http::{AppState, HttpServer, ServerConfig, StateOptions};

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},scribeline={},tower_http=debug", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Scribeline v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    let signer = UrlSigner::new(
        config.server.public_base_url(),
        &config.storage.signing_secret,
    );

    // 对象存储后端，本地后端同时提供签名 URL 数据面
    let (object_storage, object_data): (Arc<dyn ObjectStoragePort>, Arc<dyn ObjectDataPort>) =
        match config.storage.backend {
            StorageBackend::File => {
                let store = Arc::new(
                    FileObjectStore::new(&config.storage.root_dir, signer.clone()).await?,
                );
                (store.clone() as Arc<dyn ObjectStoragePort>, store as Arc<dyn ObjectDataPort>)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory object store, objects are lost on restart");
                let store = Arc::new(MemoryObjectStore::new(signer.clone()));
                (store.clone() as Arc<dyn ObjectStoragePort>, store as Arc<dyn ObjectDataPort>)
            }
        };

    // 推理任务服务
    let job_service: Arc<dyn JobServicePort> = match config.inference.backend {
        InferenceBackend::Runpod => {
            let client_config = RunpodClientConfig::new(config.inference.api_key.clone())
                .with_timeout(config.inference.timeout_secs);
            Arc::new(RunpodJobClient::new(client_config)?)
        }
        InferenceBackend::Fake => {
            tracing::warn!("Using fake inference backend, jobs are never executed");
            Arc::new(FakeJobService::new())
        }
    };

    let state = AppState::new(
        object_storage,
        Some(object_data),
        signer,
        job_service,
        StateOptions {
            url_ttl: config.storage.url_ttl(),
            cleanup_concurrency: config.storage.cleanup_concurrency,
            inference_endpoint: config.inference.endpoint.clone(),
        },
    );

    let max_body_bytes = usize::try_from(config.storage.max_object_bytes).unwrap_or(usize::MAX);
    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_max_body_bytes(max_body_bytes);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
