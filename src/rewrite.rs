//! Response host rewriting / 响应主机重写
//!
//! Rewrites absolute private-origin URLs in outgoing JSON payloads to the
//! public-facing origin. Strings carrying a query-string signature are never
//! touched: rewriting them would invalidate the signature.
//! 将出站JSON载荷中的私有源绝对URL重写为对外公开源。携带查询串签名的字符串
//! 绝不改写：改写会使签名失效。

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use serde_json::Value;

use crate::state::AppState;

/// Marker identifying signed URLs; case-insensitive substring. Also covers
/// `X-Amz-Signature=` since the marker is a suffix of its lowercase form.
/// 识别签名URL的标记，大小写不敏感子串；X-Amz-Signature= 小写后亦含此后缀。
const SIGNATURE_MARKER: &str = "signature=";

/// Largest JSON body the middleware buffers; backend-role responses are small
/// envelopes, anything past this fails instead of growing unbounded
/// 中间件缓冲的最大JSON响应体；后端角色的响应都是小载荷，超出即失败而不是无限增长
const MAX_REWRITE_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Whether a string leaf carries a signature / 字符串叶节点是否携带签名
pub fn contains_signature(value: &str) -> bool {
    value.to_ascii_lowercase().contains(SIGNATURE_MARKER)
}

/// Recursively rewrite string leaves of a payload tree / 递归重写载荷树的字符串叶节点
///
/// Objects and arrays are walked in place; key order and non-string leaves
/// are preserved. / 对象与数组原位遍历，键顺序与非字符串叶节点保持不变。
pub fn rewrite_payload(value: &mut Value, private_origin: &str, public_origin: &str) {
    match value {
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                rewrite_payload(v, private_origin, public_origin);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                rewrite_payload(v, private_origin, public_origin);
            }
        }
        Value::String(s) => {
            if let Some(rewritten) = rewrite_string(s, private_origin, public_origin) {
                *s = rewritten;
            }
        }
        // 非字符串标量不改动
        _ => {}
    }
}

/// Rewrite a single string leaf, or None when it must stay as-is
/// 重写单个字符串叶节点，无需改动时返回 None
fn rewrite_string(value: &str, private_origin: &str, public_origin: &str) -> Option<String> {
    if contains_signature(value) {
        return None;
    }
    let suffix = value.strip_prefix(private_origin)?;
    // 仅匹配完整的源前缀（后随路径分隔符），避免半截主机名被替换
    if !suffix.starts_with('/') {
        return None;
    }
    Some(format!("{}{}", public_origin, suffix))
}

/// Axum middleware applying the rewrite to JSON responses leaving the backend
/// 应用于后端出站JSON响应的中间件
pub async fn rewrite_response_hosts(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;

    let public_origin = state.config.gateway.public_base_url.trim_end_matches('/');
    let private_origin = state.config.gateway.api_base_url.trim_end_matches('/');

    // Skip when either base is missing or they are identical / 任一源缺失或相同时跳过
    if public_origin.is_empty() || private_origin.is_empty() || public_origin == private_origin {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_REWRITE_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("读取响应体失败: {}", e);
            return Response::builder()
                .status(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap();
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(mut payload) => {
            rewrite_payload(&mut payload, private_origin, public_origin);
            let rewritten = serde_json::to_vec(&payload).unwrap_or_else(|_| bytes.to_vec());
            // 长度可能变化，由新响应体重新计算
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(rewritten))
        }
        // Not a JSON tree after all; pass through untouched / 非JSON树，原样透传
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const API: &str = "https://api.internal.example";
    const FRONT: &str = "https://forms.example";

    #[test]
    fn test_rewrites_plain_urls() {
        let mut payload = json!({
            "logo": format!("{}/assets/logo.png", API),
            "nested": { "link": format!("{}/forms/abc", API) },
            "list": [format!("{}/a", API), "plain text"],
            "count": 42,
            "flag": true,
        });
        rewrite_payload(&mut payload, API, FRONT);
        assert_eq!(payload["logo"], format!("{}/assets/logo.png", FRONT));
        assert_eq!(payload["nested"]["link"], format!("{}/forms/abc", FRONT));
        assert_eq!(payload["list"][0], format!("{}/a", FRONT));
        assert_eq!(payload["list"][1], "plain text");
        assert_eq!(payload["count"], 42);
        assert_eq!(payload["flag"], true);
    }

    #[test]
    fn test_skips_signed_urls() {
        let signed = format!("{}/assets/x?X-Amz-Signature=deadbeef", API);
        let also_signed = format!("{}/assets/y?signature=abc", API);
        let mut payload = json!({ "a": signed, "b": also_signed });
        rewrite_payload(&mut payload, API, FRONT);
        assert_eq!(payload["a"], signed);
        assert_eq!(payload["b"], also_signed);
    }

    #[test]
    fn test_requires_full_origin_prefix() {
        // 半截主机名不能被替换
        let mut payload = json!({
            "similar": "https://api.internal.example.evil.com/x",
            "bare": API,
        });
        rewrite_payload(&mut payload, API, FRONT);
        assert_eq!(payload["similar"], "https://api.internal.example.evil.com/x");
        assert_eq!(payload["bare"], API);
    }

    #[test]
    fn test_round_trip_restores_original() {
        let original = json!({
            "url": format!("{}/assets/logo.png", API),
            "signed": format!("{}/assets/x?X-Amz-Signature=ff", API),
            "other": "hello",
        });
        let mut payload = original.clone();
        rewrite_payload(&mut payload, API, FRONT);
        rewrite_payload(&mut payload, FRONT, API);
        assert_eq!(payload, original);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let mut payload = json!({ "url": format!("{}/assets/logo.png", API) });
        rewrite_payload(&mut payload, API, FRONT);
        let once = payload.clone();
        rewrite_payload(&mut payload, API, FRONT);
        assert_eq!(payload, once);
    }

    #[test]
    fn test_identical_origins_unchanged() {
        let original = json!({ "url": format!("{}/assets/logo.png", API) });
        let mut payload = original.clone();
        // 中间件在源相同的情况下直接跳过；纯函数同样保持不变
        rewrite_payload(&mut payload, API, API);
        assert_eq!(payload, original);
    }

    #[test]
    fn test_preserves_key_order() {
        let raw = r#"{"z":"1","a":"2","m":"3"}"#;
        let mut payload: Value = serde_json::from_str(raw).unwrap();
        let keys_before: Vec<String> = payload.as_object().unwrap().keys().cloned().collect();
        rewrite_payload(&mut payload, API, FRONT);
        let keys_after: Vec<String> = payload.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys_before, keys_after);
    }
}
