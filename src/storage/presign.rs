//! Temporary download URL presigner / 临时下载URL预签名器
//!
//! Narrow specialization for already-stored objects: joins the configured key
//! prefix with a caller-relative path, presigns a GET, then applies the
//! configured host rewrites for deployments where the signing host differs
//! from the publicly reachable one.
//! 针对已存储对象的窄化实现：拼接配置的键前缀与相对路径，预签名GET，
//! 再应用配置的主机替换规则（签名主机与公网可达主机不同的部署场景）。

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use s3::bucket::Bucket;

use crate::config::{RewriteRule, StorageConfig};

/// Temporary-URL presigner / 临时URL预签名器
#[derive(Debug, Clone, Default)]
pub struct TempUrlPresigner {
    prefix: String,
    rewrites: Vec<RewriteRule>,
}

impl TempUrlPresigner {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            rewrites: config.temporary_url_rewrites.clone(),
        }
    }

    /// Presign a GET URL for the object at `path` / 为 path 处的对象预签名GET URL
    ///
    /// `options` are extra query parameters merged into the signed request
    /// (e.g. response-content-disposition). / options 为合并进签名请求的额外查询参数。
    pub async fn presign_download(
        &self,
        bucket: &Bucket,
        path: &str,
        expiry_secs: u32,
        options: Option<HashMap<String, String>>,
    ) -> Result<String> {
        let key = join_object_key(&self.prefix, path);
        let url = bucket
            .presign_get(&key, expiry_secs, options)
            .await
            .map_err(|e| anyhow!("生成预签名URL失败: {}", e))?;
        Ok(self.apply_rewrites(url))
    }

    /// Apply literal substring rewrites in configured order; later rules see
    /// the output of earlier ones, so the last registered rule wins on overlap
    /// 按配置顺序应用字面子串替换；后面的规则作用于前面规则的输出，重叠时后注册者生效
    fn apply_rewrites(&self, mut url: String) -> String {
        for rule in &self.rewrites {
            url = url.replace(&rule.from, &rule.to);
        }
        url
    }
}

/// Join the configured prefix with a caller-relative path, avoiding doubled
/// or missing separators / 拼接配置前缀与相对路径，避免重复或缺失的分隔符
pub fn join_object_key(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let path = path.trim_start_matches('/');

    if prefix.is_empty() {
        path.to_string()
    } else if path.is_empty() {
        prefix.to_string()
    } else {
        format!("{}/{}", prefix, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::client::build_bucket;
    use crate::storage::credentials::CredentialSet;
    use crate::storage::profile::StorageProfile;

    #[test]
    fn test_join_object_key() {
        assert_eq!(join_object_key("", "logo.png"), "logo.png");
        assert_eq!(join_object_key("forms", "logo.png"), "forms/logo.png");
        assert_eq!(join_object_key("forms/", "/logo.png"), "forms/logo.png");
        assert_eq!(join_object_key("/forms/", "a/b.png"), "forms/a/b.png");
        assert_eq!(join_object_key("forms", ""), "forms");
        assert_eq!(join_object_key("", ""), "");
    }

    #[test]
    fn test_rewrites_preserve_configured_order() {
        let presigner = TempUrlPresigner {
            prefix: String::new(),
            rewrites: vec![
                RewriteRule {
                    from: "internal.gateway".to_string(),
                    to: "public.gateway".to_string(),
                },
                RewriteRule {
                    from: "public.gateway".to_string(),
                    to: "cdn.gateway".to_string(),
                },
            ],
        };
        // 重叠规则：后注册者生效
        let out = presigner.apply_rewrites("https://internal.gateway/assets/x".to_string());
        assert_eq!(out, "https://cdn.gateway/assets/x");
    }

    #[test]
    fn test_no_rewrites_is_identity() {
        let presigner = TempUrlPresigner::default();
        let url = "https://gateway.storjshare.io/assets/x?X-Amz-Signature=ff".to_string();
        assert_eq!(presigner.apply_rewrites(url.clone()), url);
    }

    #[tokio::test]
    async fn test_presign_download_applies_prefix_and_rewrites() {
        let config = StorageConfig {
            endpoint: "https://internal.gateway.example".to_string(),
            region: "us-east-1".to_string(),
            signing_region: "us-east-1".to_string(),
            bucket: "assets".to_string(),
            prefix: "forms".to_string(),
            aws_key: "test-access-key".to_string(),
            aws_secret: "test-secret-key".to_string(),
            temporary_url_rewrites: vec![RewriteRule {
                from: "internal.gateway.example".to_string(),
                to: "public.gateway.example".to_string(),
            }],
            ..Default::default()
        };
        let profile = StorageProfile::resolve(&config);
        let creds = CredentialSet::resolve(&config, &profile);
        let bucket = build_bucket(&profile, &creds, &config.bucket).unwrap();

        let presigner = TempUrlPresigner::new(&config);
        let url = presigner
            .presign_download(&bucket, "/logo.png", 300, None)
            .await
            .unwrap();

        assert!(url.contains("public.gateway.example"));
        assert!(!url.contains("internal.gateway.example"));
        assert!(url.contains("forms/logo.png"));
    }
}
