//! Storage provider resolution / 存储提供商识别
//!
//! Decides which provider profile applies to a configured endpoint and what
//! that provider is capable of. Pure function of configuration, no network
//! calls; recomputed per request so runtime config changes take effect.
//! 根据配置的端点决定适用的提供商配置及其能力。纯配置函数，无网络调用；
//! 每个请求重新计算，配置变更即时生效。

use crate::config::StorageConfig;

/// Hostname fragments identifying S3-compatible alternate providers
/// (no ACL support, no STS session tokens)
/// 识别 S3 兼容替代提供商的主机名片段（不支持ACL，不支持STS会话令牌）
const ALT_PROVIDER_HOSTS: &[&str] = &["storjshare.io", "storj.io"];

/// Provider profile derived from the configured endpoint / 从配置端点推导的提供商配置
#[derive(Debug, Clone, PartialEq)]
pub struct StorageProfile {
    /// Endpoint URL / 端点URL
    pub endpoint: String,
    /// Functional region / 存储区域
    pub region: String,
    /// Region entering the signature scope; some gateways require a fixed
    /// signing region regardless of the functional one
    /// 进入签名范围的区域；部分网关要求固定签名区域
    pub signing_region: String,
    /// Path-style addressing (https://host/bucket/key) / 路径风格寻址
    pub path_style: bool,
    /// Provider accepts per-object ACL parameters / 提供商支持对象ACL参数
    pub supports_acl: bool,
    /// Provider accepts STS session tokens / 提供商支持STS会话令牌
    pub supports_session_token: bool,
}

impl StorageProfile {
    /// Resolve the provider profile for a storage configuration
    /// 解析存储配置对应的提供商配置
    ///
    /// Anything not matching a known alternate-provider hostname is treated
    /// as standard AWS S3. With no endpoint configured, the AWS endpoint for
    /// the configured region is assumed.
    /// 未匹配已知替代提供商主机名的端点视为标准 AWS S3；未配置端点时按区域推导 AWS 端点。
    pub fn resolve(config: &StorageConfig) -> Self {
        let alternate = is_alternate_provider(&config.endpoint);

        let endpoint = if config.endpoint.is_empty() {
            format!("https://s3.{}.amazonaws.com", config.region)
        } else {
            config.endpoint.clone()
        };

        Self {
            endpoint,
            region: config.region.clone(),
            signing_region: config.signing_region.clone(),
            // Non-AWS gateways generally do not support virtual-hosted-style
            // addressing / 非AWS网关通常不支持虚拟主机风格寻址
            path_style: !config.endpoint.is_empty(),
            supports_acl: !alternate,
            supports_session_token: !alternate,
        }
    }
}

/// Case-insensitive substring match against known alternate-provider hosts
/// 对已知替代提供商主机名做大小写不敏感的子串匹配
pub fn is_alternate_provider(endpoint: &str) -> bool {
    if endpoint.is_empty() {
        return false;
    }
    let lower = endpoint.to_ascii_lowercase();
    ALT_PROVIDER_HOSTS.iter().any(|h| lower.contains(h))
}
