//! Storage client factory / 存储客户端工厂
//!
//! Builds an S3 client for a resolved provider profile. The signing region is
//! what enters the SigV4 credential scope, so it is the one carried by the
//! custom region; path-style addressing is applied per profile.
//! 为解析后的提供商配置构建S3客户端。签名区域进入SigV4凭证范围，由自定义区域承载；
//! 按配置应用路径风格寻址。

use anyhow::{anyhow, Result};
use s3::bucket::Bucket;
use s3::Region;

use crate::storage::credentials::CredentialSet;
use crate::storage::profile::StorageProfile;

/// Create an S3 bucket client / 创建S3 Bucket客户端
///
/// Never fails for missing credentials; an empty set yields an anonymous
/// client and signing errors surface later at presign time.
/// 凭证缺失不会失败；空凭证产生匿名客户端，签名错误在预签名时才出现。
pub fn build_bucket(
    profile: &StorageProfile,
    credentials: &CredentialSet,
    bucket_name: &str,
) -> Result<Box<Bucket>> {
    let credentials = credentials.to_s3_credentials()?;

    let region = Region::Custom {
        region: profile.signing_region.clone(),
        endpoint: profile.endpoint.clone(),
    };

    let bucket = Bucket::new(bucket_name, region, credentials)
        .map_err(|e| anyhow!("创建S3 Bucket失败: {}", e))?;

    let bucket = if profile.path_style {
        bucket.with_path_style()
    } else {
        bucket
    };

    Ok(bucket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    #[test]
    fn test_build_bucket_with_empty_credentials() {
        let config = StorageConfig {
            endpoint: "https://gateway.storjshare.io".to_string(),
            region: "us-east-1".to_string(),
            signing_region: "us-east-1".to_string(),
            ..Default::default()
        };
        let profile = StorageProfile::resolve(&config);
        let creds = CredentialSet::resolve(&config, &profile);

        // Anonymous client, not an error / 匿名客户端，而不是错误
        let bucket = build_bucket(&profile, &creds, "assets").unwrap();
        assert_eq!(bucket.name(), "assets");
    }

    #[test]
    fn test_build_bucket_signing_region() {
        let config = StorageConfig {
            endpoint: "https://gateway.storjshare.io".to_string(),
            region: "eu-central-1".to_string(),
            signing_region: "us-east-1".to_string(),
            aws_key: "k".to_string(),
            aws_secret: "s".to_string(),
            ..Default::default()
        };
        let profile = StorageProfile::resolve(&config);
        let creds = CredentialSet::resolve(&config, &profile);
        let bucket = build_bucket(&profile, &creds, "assets").unwrap();
        // 签名区域进入凭证范围
        assert_eq!(bucket.region().to_string(), "us-east-1");
    }
}
