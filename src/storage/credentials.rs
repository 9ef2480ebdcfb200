//! Credential resolution / 凭证解析
//!
//! Provider-specific variables win over the generic fallback; an empty set is
//! valid and maps to anonymous credentials instead of empty-string fields
//! (the client library rejects empty credential fields).
//! 提供商专用变量优先于通用回退；空凭证集合法，映射为匿名凭证而不是空字符串字段。

use anyhow::{anyhow, Result};
use s3::creds::Credentials;

use crate::config::StorageConfig;
use crate::storage::profile::StorageProfile;

/// Resolved credential set / 解析后的凭证集
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialSet {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub session_token: Option<String>,
}

impl CredentialSet {
    /// Resolve credentials for a provider profile / 为提供商配置解析凭证
    ///
    /// Session token is included only when the provider supports it and a
    /// token is present. / 仅当提供商支持且令牌存在时才包含会话令牌。
    pub fn resolve(config: &StorageConfig, profile: &StorageProfile) -> Self {
        let access_key = first_non_empty(&config.storj_key, &config.aws_key);
        let secret_key = first_non_empty(&config.storj_secret, &config.aws_secret);

        let session_token = if profile.supports_session_token && !config.session_token.is_empty() {
            Some(config.session_token.clone())
        } else {
            None
        };

        Self {
            access_key,
            secret_key,
            session_token,
        }
    }

    /// No keys present / 无可用密钥
    pub fn is_empty(&self) -> bool {
        self.access_key.is_none() && self.secret_key.is_none()
    }

    /// Convert to client-library credentials / 转换为客户端库凭证
    ///
    /// An empty set becomes anonymous credentials; signing then fails at
    /// request time if the store actually requires authentication.
    /// 空集变为匿名凭证；若存储确实需要认证，签名在请求时才失败。
    pub fn to_s3_credentials(&self) -> Result<Credentials> {
        if self.is_empty() {
            return Credentials::anonymous().map_err(|e| anyhow!("创建匿名S3凭证失败: {}", e));
        }

        Credentials::new(
            self.access_key.as_deref(),
            self.secret_key.as_deref(),
            self.session_token.as_deref(),
            None,
            None,
        )
        .map_err(|e| anyhow!("创建S3凭证失败: {}", e))
    }
}

fn first_non_empty(primary: &str, fallback: &str) -> Option<String> {
    if !primary.is_empty() {
        Some(primary.to_string())
    } else if !fallback.is_empty() {
        Some(fallback.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(supports_session_token: bool) -> StorageProfile {
        StorageProfile {
            endpoint: "https://s3.us-east-1.amazonaws.com".to_string(),
            region: "us-east-1".to_string(),
            signing_region: "us-east-1".to_string(),
            path_style: false,
            supports_acl: supports_session_token,
            supports_session_token,
        }
    }

    #[test]
    fn test_provider_specific_wins_over_fallback() {
        let config = StorageConfig {
            storj_key: "storj-key".to_string(),
            storj_secret: "storj-secret".to_string(),
            aws_key: "aws-key".to_string(),
            aws_secret: "aws-secret".to_string(),
            ..Default::default()
        };
        let creds = CredentialSet::resolve(&config, &profile(true));
        assert_eq!(creds.access_key.as_deref(), Some("storj-key"));
        assert_eq!(creds.secret_key.as_deref(), Some("storj-secret"));
    }

    #[test]
    fn test_generic_fallback() {
        let config = StorageConfig {
            aws_key: "aws-key".to_string(),
            aws_secret: "aws-secret".to_string(),
            ..Default::default()
        };
        let creds = CredentialSet::resolve(&config, &profile(true));
        assert_eq!(creds.access_key.as_deref(), Some("aws-key"));
    }

    #[test]
    fn test_session_token_excluded_for_alternate_provider() {
        let config = StorageConfig {
            aws_key: "k".to_string(),
            aws_secret: "s".to_string(),
            session_token: "sts-token".to_string(),
            ..Default::default()
        };
        let with_token = CredentialSet::resolve(&config, &profile(true));
        assert_eq!(with_token.session_token.as_deref(), Some("sts-token"));

        let without_token = CredentialSet::resolve(&config, &profile(false));
        assert!(without_token.session_token.is_none());
    }

    #[test]
    fn test_empty_set_is_valid() {
        let creds = CredentialSet::resolve(&StorageConfig::default(), &profile(true));
        assert!(creds.is_empty());
        assert!(creds.session_token.is_none());
        // Must map to anonymous credentials, not empty strings / 必须映射为匿名凭证
        assert!(creds.to_s3_credentials().is_ok());
    }
}
