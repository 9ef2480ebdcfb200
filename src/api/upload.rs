use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::body::Body;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::StorageConfig;
use crate::state::AppState;
use crate::storage::{build_bucket, issue, CredentialSet, SignedUrlRequest, StorageProfile};

#[derive(Debug, Deserialize)]
pub struct SignedStorageUrlReq {
    pub bucket: Option<String>,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub expires: Option<String>,
    pub visibility: Option<String>,
}

/// POST /api/signed-storage-url - 签发预签名上传URL
/// Issue a presigned upload URL
///
/// The object key is generated server-side under tmp/ so callers can never
/// target pre-existing keys. / 对象键在服务端生成于 tmp/ 下，调用方无法指向已有键。
pub async fn create_signed_storage_url(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignedStorageUrlReq>,
) -> Response {
    // 每个请求重新解析存储配置，凭证或端点变更即时生效
    let storage = StorageConfig::from_env();
    let profile = StorageProfile::resolve(&storage);

    let bucket_name = req
        .bucket
        .as_deref()
        .filter(|b| !b.is_empty())
        .unwrap_or(&storage.bucket)
        .to_string();
    if bucket_name.is_empty() {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "存储桶未配置");
    }

    let credentials = CredentialSet::resolve(&storage, &profile);
    let bucket = match build_bucket(&profile, &credentials, &bucket_name) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("创建存储客户端失败: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "创建存储客户端失败");
        }
    };

    let mut sign_req = SignedUrlRequest::put(&bucket_name);
    sign_req.content_type = req.content_type;
    sign_req.cache_control = req.cache_control;
    sign_req.expires = req.expires;
    sign_req.visibility = req.visibility;
    sign_req.expires_in_minutes = Some(state.config.gateway.signed_url_expires_minutes);

    match issue(&sign_req, &bucket, &profile).await {
        Ok(result) => {
            let headers: serde_json::Map<String, Value> = result
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();

            tracing::debug!(
                "signed-storage-url: bucket={}, key={}, expires_at={}",
                result.bucket,
                result.key,
                result.expires_at.to_rfc3339()
            );

            let body = json!({
                "uuid": result.uuid,
                "bucket": result.bucket,
                "key": result.key,
                "url": result.url,
                "headers": headers,
            });

            Response::builder()
                .status(StatusCode::CREATED)
                .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
                .body(Body::from(body.to_string()))
                .unwrap()
        }
        Err(e) => {
            tracing::error!("签发预签名上传URL失败: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "签发预签名上传URL失败")
        }
    }
}

/// 创建错误响应
fn error_response(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "code": status.as_u16(),
        "message": message,
    });
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
        .body(Body::from(body.to_string()))
        .unwrap()
}
