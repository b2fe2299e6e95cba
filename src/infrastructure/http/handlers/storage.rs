//! Storage HTTP Handlers - 签名 URL 数据面
//!
//! 客户端直接对签名 URL 发起 PUT / GET，不走 JSON 信封，
//! 使用真实 HTTP 状态码：签名错误或过期返回 403。

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::application::{ObjectDataPort, ObjectStoreError, SignedMethod};
use crate::infrastructure::http::state::AppState;

/// 签名参数
#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub method: Option<String>,
    pub expires: Option<String>,
    pub signature: Option<String>,
}

/// 数据面错误
#[derive(Debug)]
pub enum StorageAccessError {
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for StorageAccessError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            StorageAccessError::Forbidden(msg) => {
                tracing::warn!(error = %msg, "Signed URL rejected");
                (StatusCode::FORBIDDEN, msg)
            }
            StorageAccessError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            StorageAccessError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            StorageAccessError::Internal(msg) => {
                tracing::error!(error = %msg, "Storage data plane error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, msg).into_response()
    }
}

impl From<ObjectStoreError> for StorageAccessError {
    fn from(e: ObjectStoreError) -> Self {
        match e {
            ObjectStoreError::NotFound(key) => {
                StorageAccessError::NotFound(format!("object not found: {}", key))
            }
            ObjectStoreError::InvalidKey(msg) => StorageAccessError::BadRequest(msg),
            other => StorageAccessError::Internal(other.to_string()),
        }
    }
}

/// 通配路由捕获的 key 可能带前导 `/`
fn normalize_key(raw: &str) -> &str {
    raw.strip_prefix('/').unwrap_or(raw)
}

/// 校验签名，返回可用的数据面
fn authorize<'a>(
    state: &'a AppState,
    method: SignedMethod,
    key: &str,
    query: &SignedQuery,
) -> Result<&'a Arc<dyn ObjectDataPort>, StorageAccessError> {
    let data = state
        .object_data
        .as_ref()
        .ok_or_else(|| StorageAccessError::NotFound("storage data plane disabled".to_string()))?;

    let signed_method = query
        .method
        .as_deref()
        .and_then(SignedMethod::from_str)
        .ok_or_else(|| StorageAccessError::Forbidden("missing or unknown method".to_string()))?;
    if signed_method != method {
        return Err(StorageAccessError::Forbidden(format!(
            "URL signed for {}, used with {}",
            signed_method.as_str(),
            method.as_str()
        )));
    }

    let expires = query
        .expires
        .as_deref()
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| StorageAccessError::Forbidden("missing or invalid expires".to_string()))?;
    let signature = query
        .signature
        .as_deref()
        .ok_or_else(|| StorageAccessError::Forbidden("missing signature".to_string()))?;

    state
        .signer
        .verify(method, key, expires, signature)
        .map_err(|e| StorageAccessError::Forbidden(e.to_string()))?;

    Ok(data)
}

/// PUT 签名 URL：写入对象
pub async fn put_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
    body: Bytes,
) -> Result<StatusCode, StorageAccessError> {
    let key = normalize_key(&key);
    let data = authorize(&state, SignedMethod::Put, key, &query)?;

    let size = data.put_object(key, body).await?;
    tracing::debug!(key = %key, size, "Object uploaded via signed URL");
    Ok(StatusCode::OK)
}

/// GET 签名 URL：流式返回对象
pub async fn get_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, StorageAccessError> {
    let key = normalize_key(&key);
    let data = authorize(&state, SignedMethod::Get, key, &query)?;

    let (size, stream) = data.get_object(key).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(stream))
        .map_err(|e| StorageAccessError::Internal(e.to_string()))
}
