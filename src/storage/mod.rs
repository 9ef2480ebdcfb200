//! Storage access layer / 存储访问层
//!
//! Provider resolution, credential handling, client construction and
//! presigned-URL generation for S3 and S3-compatible gateways.
//! 针对 S3 及 S3 兼容网关的提供商识别、凭证处理、客户端构建和预签名URL生成。

pub mod client;
pub mod credentials;
pub mod presign;
pub mod profile;
pub mod signer;

pub use client::build_bucket;
pub use credentials::CredentialSet;
pub use presign::TempUrlPresigner;
pub use profile::StorageProfile;
pub use signer::{issue, SignedOperation, SignedUrlRequest, SignedUrlResult};
