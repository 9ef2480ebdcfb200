use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;

use crate::config::StorageConfig;
use crate::error::GatewayError;
use crate::state::AppState;
use crate::storage::{build_bucket, CredentialSet, StorageProfile, TempUrlPresigner};

/// GET /api/assets/:file - 重定向到预签名下载URL（不跟随）
/// Redirect to a presigned download URL (redirect form)
///
/// The Location header carries the signed URL; consumers that must not expose
/// it to end clients extract it without following the redirect.
/// Location 头携带签名URL；不得向终端客户端暴露签名的消费方提取该头而不跟随重定向。
pub async fn asset_redirect(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
) -> Result<Response, GatewayError> {
    if file.trim().is_empty() {
        return Err(GatewayError::MissingFilename);
    }

    let storage = StorageConfig::from_env();
    if storage.bucket.is_empty() {
        return Err(GatewayError::Configuration("AWS_BUCKET"));
    }

    let profile = StorageProfile::resolve(&storage);
    let credentials = CredentialSet::resolve(&storage, &profile);
    let bucket = build_bucket(&profile, &credentials, &storage.bucket).map_err(|e| {
        tracing::error!("创建存储客户端失败: {}", e);
        GatewayError::Signing
    })?;

    let expiry_secs = (state.config.gateway.signed_url_expires_minutes.max(1) * 60) as u32;
    let presigner = TempUrlPresigner::new(&storage);
    let url = presigner
        .presign_download(&bucket, &file, expiry_secs, None)
        .await
        .map_err(|e| {
            tracing::error!("生成预签名下载URL失败: {}", e);
            GatewayError::Signing
        })?;

    tracing::debug!("asset_redirect: 302重定向 file={}", file);

    // 签名URL有效期有限，禁止中间缓存
    Ok(Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, url)
        .header("Referrer-Policy", "no-referrer")
        .header(
            header::CACHE_CONTROL,
            "max-age=0, no-cache, no-store, must-revalidate",
        )
        .body(Body::empty())
        .unwrap())
}
