//! Signed URL issuance / 签名URL签发
//!
//! Produces time-bounded presigned PUT/GET requests. Upload keys are always
//! generated server-side under the temporary namespace so presigned uploads
//! cannot target pre-existing keys. Parameters unsupported by the active
//! provider are stripped before signing.
//! 生成限时预签名 PUT/GET 请求。上传键始终在服务端生成于临时命名空间下，
//! 预签名上传无法指向已有对象键。当前提供商不支持的参数在签名前剔除。

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use s3::bucket::Bucket;
use url::Url;
use uuid::Uuid;

use crate::storage::profile::StorageProfile;

/// Default signature lifetime in minutes / 默认签名有效期（分钟）
pub const DEFAULT_EXPIRES_MINUTES: i64 = 5;

/// Visibility used when the caller specifies none / 调用方未指定时的可见性
const DEFAULT_VISIBILITY: &str = "private";

/// Namespace for server-generated upload keys / 服务端生成上传键的命名空间
const UPLOAD_KEY_PREFIX: &str = "tmp/";

/// Logical signed operation / 逻辑签名操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedOperation {
    Put,
    Get,
}

/// One signed-URL request / 一次签名URL请求
#[derive(Debug, Clone)]
pub struct SignedUrlRequest {
    pub operation: SignedOperation,
    pub bucket: String,
    /// Object key for GET; ignored for PUT, which generates a fresh key
    /// GET 的对象键；PUT 忽略此字段并生成新键
    pub key: String,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    /// Value for the object's Expires response header / 对象 Expires 响应头的值
    pub expires: Option<String>,
    pub visibility: Option<String>,
    /// Signature lifetime, default 5 minutes / 签名有效期，默认5分钟
    pub expires_in_minutes: Option<i64>,
}

impl SignedUrlRequest {
    /// Upload request; the key is generated at issue time / 上传请求，签发时生成键
    pub fn put(bucket: impl Into<String>) -> Self {
        Self {
            operation: SignedOperation::Put,
            bucket: bucket.into(),
            key: String::new(),
            content_type: None,
            cache_control: None,
            expires: None,
            visibility: None,
            expires_in_minutes: None,
        }
    }

    /// Download request for an existing key / 已有对象键的下载请求
    pub fn get(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            operation: SignedOperation::Get,
            bucket: bucket.into(),
            key: key.into(),
            content_type: None,
            cache_control: None,
            expires: None,
            visibility: None,
            expires_in_minutes: None,
        }
    }
}

/// Issued signed URL / 签发的签名URL
#[derive(Debug, Clone)]
pub struct SignedUrlResult {
    /// Fresh identifier for uploads / 上传的新标识符
    pub uuid: Option<String>,
    pub bucket: String,
    pub key: String,
    /// scheme + authority + path + query, signature embedded in the query
    /// scheme + authority + path + query，签名内嵌于查询串
    pub url: String,
    /// Headers the client must send with the subsequent request, in order
    /// 客户端后续请求必须携带的请求头（有序）
    pub headers: Vec<(String, String)>,
    pub expires_at: DateTime<Utc>,
}

/// Issue a presigned request for the given operation / 为给定操作签发预签名请求
pub async fn issue(
    req: &SignedUrlRequest,
    bucket: &Bucket,
    profile: &StorageProfile,
) -> Result<SignedUrlResult> {
    let expires_minutes = req
        .expires_in_minutes
        .unwrap_or(DEFAULT_EXPIRES_MINUTES)
        .max(1);
    let expiry_secs = (expires_minutes * 60) as u32;
    let expires_at = Utc::now() + Duration::minutes(expires_minutes);

    match req.operation {
        SignedOperation::Put => {
            let uuid = Uuid::new_v4().to_string();
            let key = format!("{}{}", UPLOAD_KEY_PREFIX, uuid);

            // Omit absent/empty parameters entirely; never sign empty strings
            // 完全省略缺失或空的参数，绝不签名空字符串
            let mut headers: Vec<(String, String)> = Vec::new();
            headers.push((
                "Content-Type".to_string(),
                non_empty(&req.content_type)
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            ));
            if let Some(cache_control) = non_empty(&req.cache_control) {
                headers.push(("Cache-Control".to_string(), cache_control));
            }
            if let Some(expires) = non_empty(&req.expires) {
                headers.push(("Expires".to_string(), expires));
            }

            // Alternate providers reject the whole request on an ACL field,
            // not just the field / 替代提供商遇到ACL字段会拒绝整个请求而不是忽略该字段
            let mut queries: HashMap<String, String> = HashMap::new();
            if profile.supports_acl {
                let visibility = non_empty(&req.visibility)
                    .unwrap_or_else(|| DEFAULT_VISIBILITY.to_string());
                queries.insert("x-amz-acl".to_string(), visibility);
            }
            let custom_queries = if queries.is_empty() {
                None
            } else {
                Some(queries)
            };

            // Required headers enter the signature scope; a PUT with different
            // header values fails signature validation at the store
            // 要求的请求头进入签名范围；请求头不一致的PUT在存储端签名校验失败
            let url = bucket
                .presign_put(&key, expiry_secs, Some(to_header_map(&headers)?), custom_queries)
                .await
                .map_err(|e| anyhow!("生成预签名上传URL失败: {}", e))?;

            Ok(SignedUrlResult {
                uuid: Some(uuid),
                bucket: req.bucket.clone(),
                key,
                url: decompose_url(&url)?,
                headers,
                expires_at,
            })
        }
        SignedOperation::Get => {
            let url = bucket
                .presign_get(&req.key, expiry_secs, None)
                .await
                .map_err(|e| anyhow!("生成预签名URL失败: {}", e))?;

            Ok(SignedUrlResult {
                uuid: None,
                bucket: req.bucket.clone(),
                key: req.key.clone(),
                url: decompose_url(&url)?,
                headers: Vec::new(),
                expires_at,
            })
        }
    }
}

/// Rebuild the URL as scheme+authority+path+query so callers never need to
/// re-encode or store the full URL object
/// 以 scheme+authority+path+query 重组URL，调用方无需重新编码或保存完整URL对象
fn decompose_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| anyhow!("解析预签名URL失败: {}", e))?;
    let mut out = format!(
        "{}://{}{}",
        parsed.scheme(),
        parsed.authority(),
        parsed.path()
    );
    if let Some(query) = parsed.query() {
        out.push('?');
        out.push_str(query);
    }
    Ok(out)
}

/// 将请求头列表转换为签名用的HeaderMap
fn to_header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| anyhow!("非法请求头名 {}: {}", name, e))?;
        let value =
            HeaderValue::from_str(value).map_err(|e| anyhow!("非法请求头值: {}", e))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}
