use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use futures::TryStreamExt;

use crate::error::GatewayError;
use crate::state::AppState;

/// Request headers forwarded to the object store; anything else risks leaking
/// caller-controlled data into the signed request
/// 转发给对象存储的请求头；其余请求头可能把调用方数据泄入签名请求
const FORWARDED_REQUEST_HEADERS: &[&str] = &["range", "if-none-match", "if-modified-since", "accept"];

/// Response headers allowed to cross the trust boundary to the end client.
/// Location is deliberately absent: it would carry the signed URL.
/// 允许跨信任边界返回给终端客户端的响应头。Location 刻意排除：它携带签名URL。
const ALLOWED_RESPONSE_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "content-range",
    "accept-ranges",
    "etag",
    "last-modified",
    "cache-control",
    "content-disposition",
];

/// Short positive caching policy when the store specifies none
/// 存储未指定时的短缓存策略
const DEFAULT_CACHE_CONTROL: &str = "public, max-age=60, s-maxage=300";

/// Backend error bodies up to this size are relayed verbatim as diagnostics
/// 不超过此大小的后端错误响应体原样转发作为诊断信息
const MAX_RELAYED_ERROR_BODY: usize = 2000;

/// GET /assets/:file - 透明资产代理（不暴露签名URL）
/// Transparent asset proxy (proxied form)
///
/// Obtains the signed download URL from the backend's redirect response and
/// streams the object through, so the client never sees the URL or its
/// query-string signature. The body is streamed, never buffered.
/// 从后端的重定向响应获取签名下载URL并透传对象字节，客户端永远看不到该URL
/// 及其查询串签名。响应体流式转发，从不缓冲。
pub async fn asset_proxy(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    if file.trim().is_empty() {
        return Err(GatewayError::MissingFilename);
    }

    let backend_base = state.config.gateway.resolve_private_api_base();
    if backend_base.is_empty() {
        return Err(GatewayError::Configuration("private_api_base"));
    }

    // Step 1: 请求后端的重定向响应，但不跟随（客户端禁用了自动重定向）
    // Ask the backend for the redirect target without following it
    let backend_url = format!("{}/api/assets/{}", backend_base, urlencoding::encode(&file));
    tracing::debug!("asset_proxy: presign request file={}", file);

    // 预签名跳的响应很小，可设整体超时；流式跳只受连接超时约束
    // The presign hop carries a tiny response so a whole-request timeout is
    // safe; the streaming hop is bounded by the connect timeout only
    let presign_res = state
        .http
        .get(&backend_url)
        .header("accept", "application/json, text/plain, */*")
        .timeout(std::time::Duration::from_secs(
            state.config.gateway.proxy_timeout_secs,
        ))
        .send()
        .await
        .map_err(|e| GatewayError::BackendUnreachable(e.without_url().to_string()))?;

    let backend_status = presign_res.status().as_u16();
    if !(300..400).contains(&backend_status) {
        // 后端返回错误或非重定向：原样转发状态与简短诊断
        return Ok(relay_backend_status(presign_res).await);
    }

    let location = presign_res
        .headers()
        .get(header::LOCATION.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or(GatewayError::NoRedirectTarget)?;

    // Step 2: 使用签名URL直接获取资产，仅转发安全的条件/范围请求头
    // Fetch the asset with the signed URL, forwarding only safe headers
    let mut asset_req = state.http.get(&location);
    for name in FORWARDED_REQUEST_HEADERS {
        if let Some(value) = headers.get(*name).and_then(|v| v.to_str().ok()) {
            asset_req = asset_req.header(*name, value);
        }
    }

    let asset_res = asset_req
        .send()
        .await
        .map_err(|e| GatewayError::AssetUnreachable(e.without_url().to_string()))?;

    // Step 3: 转发状态码（200/206/304）与白名单响应头，流式透传响应体
    // Relay status and allow-listed headers, stream the body through
    let status = StatusCode::from_u16(asset_res.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);

    let upstream_headers: Vec<(String, String)> = asset_res
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();

    let mut builder = Response::builder().status(status);
    for (name, value) in filter_response_headers(&upstream_headers) {
        builder = builder.header(name, value);
    }

    tracing::debug!("asset_proxy: streaming file={}, status={}", file, status);

    let stream = asset_res
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.without_url()));

    Ok(builder.body(Body::from_stream(stream)).unwrap())
}

/// Relay a non-redirect backend response: verbatim body when small, generic
/// message otherwise / 转发后端非重定向响应：响应体较小时原样转发，否则返回通用消息
async fn relay_backend_status(res: reqwest::Response) -> Response {
    let status =
        StatusCode::from_u16(res.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE.as_str())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/plain; charset=utf-8")
        .to_string();

    let text = res.text().await.unwrap_or_default();
    let body = if !text.is_empty() && text.len() < MAX_RELAYED_ERROR_BODY {
        text
    } else {
        format!("Upstream responded with status {}", status.as_u16())
    };

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

/// Restrict upstream headers to the allow-list, defaulting Cache-Control
/// 将上游响应头限制到白名单，并在缺失时补默认 Cache-Control
fn filter_response_headers(upstream: &[(String, String)]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for allowed in ALLOWED_RESPONSE_HEADERS {
        if let Some((_, value)) = upstream
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(allowed))
        {
            out.push((allowed.to_string(), value.clone()));
        }
    }
    if !out.iter().any(|(name, _)| name == "cache-control") {
        out.push(("cache-control".to_string(), DEFAULT_CACHE_CONTROL.to_string()));
    }
    out
}
