//! Application configuration module / 应用配置模块
//!
//! Two layers of configuration / 两层配置:
//! - `AppConfig`: process-level settings loaded from config.json, created with
//!   defaults on first run / 进程级配置，从 config.json 加载，首次运行时创建默认配置文件
//! - `StorageConfig`: storage settings resolved from the environment once per
//!   request, so runtime credential/endpoint changes take effect without a
//!   restart / 存储配置，每个请求从环境变量解析一次，凭证或端点变更无需重启即可生效
//!
//! All environment reads are centralized here; other modules take the resolved
//! structs as arguments. / 所有环境变量读取集中在此模块，其他模块只接收解析好的结构体。

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Global configuration instance / 全局配置实例
static CONFIG: OnceCell<Arc<RwLock<AppConfig>>> = OnceCell::new();

/// Application configuration / 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    pub server: ServerConfig,
    /// Gateway configuration / 网关配置
    pub gateway: GatewayConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Gateway configuration / 网关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Private backend base URL used by the asset proxy; empty means the
    /// proxy route is unconfigured / 资产代理使用的私有后端基础URL，空表示未配置
    pub private_api_base: String,
    /// Public-facing origin exposed in outgoing payloads / 对外公开的源地址
    pub public_base_url: String,
    /// Private API origin hidden from clients / 对客户端隐藏的私有API源地址
    pub api_base_url: String,
    /// Timeout per upstream hop in seconds / 每跳上游请求超时（秒）
    pub proxy_timeout_secs: u64,
    /// Signed upload URL lifetime in minutes / 签名上传URL有效期（分钟）
    pub signed_url_expires_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8190,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            private_api_base: String::new(),
            public_base_url: String::new(),
            api_base_url: String::new(),
            proxy_timeout_secs: 30,
            signed_url_expires_minutes: 5,
        }
    }
}

impl AppConfig {
    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl GatewayConfig {
    /// Private backend base for the asset proxy, config value with
    /// PRIVATE_API_BASE environment fallback, trailing slashes trimmed
    /// 资产代理的私有后端地址，配置值优先，回退到 PRIVATE_API_BASE 环境变量，去除尾部斜杠
    pub fn resolve_private_api_base(&self) -> String {
        let base = if self.private_api_base.is_empty() {
            std::env::var("PRIVATE_API_BASE").unwrap_or_default()
        } else {
            self.private_api_base.clone()
        };
        base.trim_end_matches('/').to_string()
    }
}

/// Load configuration from file, creating a default config.json on first run
/// 从文件加载配置，首次运行时创建默认的 config.json
pub fn load_config() -> anyhow::Result<AppConfig> {
    load_config_from(Path::new("config.json"))
}

/// Load configuration from the given path / 从指定路径加载配置
pub fn load_config_from(path: &Path) -> anyhow::Result<AppConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    } else {
        let config = AppConfig::default();
        let content = serde_json::to_string_pretty(&config)?;
        std::fs::write(path, content)?;
        tracing::info!("Created default config file: {:?}", path);
        Ok(config)
    }
}

/// Initialize the global configuration / 初始化全局配置
pub fn init_config(config: AppConfig) {
    let _ = CONFIG.set(Arc::new(RwLock::new(config)));
}

/// Get a snapshot of the global configuration / 获取全局配置快照
pub fn get_config() -> AppConfig {
    CONFIG.get().map(|c| c.read().clone()).unwrap_or_default()
}

/// One literal substring rewrite applied to presigned URLs
/// 应用于预签名URL的一条字面子串替换规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub from: String,
    pub to: String,
}

/// Storage settings resolved from the environment / 从环境变量解析的存储配置
///
/// Resolved once per request. Empty strings mean "not configured"; the
/// credential layer treats them as absent. / 每个请求解析一次。空字符串表示未配置，
/// 凭证层将其视为缺失。
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Endpoint URL, AWS_ENDPOINT with AWS_URL fallback / 端点URL
    pub endpoint: String,
    /// Functional region / 存储区域
    pub region: String,
    /// Region used in the signature scope / 签名区域
    pub signing_region: String,
    /// Default bucket / 默认存储桶
    pub bucket: String,
    /// Key prefix prepended to download paths / 下载路径前缀
    pub prefix: String,
    /// Provider-specific credentials / 提供商专用凭证
    pub storj_key: String,
    pub storj_secret: String,
    /// Generic fallback credentials / 通用回退凭证
    pub aws_key: String,
    pub aws_secret: String,
    /// STS session token / STS会话令牌
    pub session_token: String,
    /// Ordered host rewrites for presigned URLs / 预签名URL的有序主机替换规则
    pub temporary_url_rewrites: Vec<RewriteRule>,
}

impl StorageConfig {
    /// Resolve storage configuration from the process environment
    /// 从进程环境解析存储配置
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary lookup function (tests inject a map here)
    /// 从任意查找函数解析（测试注入映射）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).unwrap_or_default();
        let var_or = |name: &str, fallback: &str| {
            let v = var(name);
            if v.is_empty() {
                fallback.to_string()
            } else {
                v
            }
        };

        // AWS_ENDPOINT first, AWS_URL second / 先 AWS_ENDPOINT，后 AWS_URL
        let endpoint = var_or("AWS_ENDPOINT", &var("AWS_URL"));

        Self {
            endpoint,
            region: var_or("AWS_DEFAULT_REGION", "us-east-1"),
            signing_region: var_or("AWS_SIGNING_REGION", "us-east-1"),
            bucket: var("AWS_BUCKET"),
            prefix: var("AWS_PREFIX"),
            storj_key: var("STORJ_KEY"),
            storj_secret: var("STORJ_SECRET"),
            aws_key: var("AWS_ACCESS_KEY_ID"),
            aws_secret: var("AWS_SECRET_ACCESS_KEY"),
            session_token: var("AWS_SESSION_TOKEN"),
            temporary_url_rewrites: parse_rewrites(&var("TEMPORARY_URL_REWRITES")),
        }
    }
}

/// Parse rewrite rules from "from=>to,from2=>to2" form, preserving order
/// 解析 "from=>to,from2=>to2" 形式的替换规则，保持顺序
fn parse_rewrites(raw: &str) -> Vec<RewriteRule> {
    raw.split(',')
        .filter_map(|pair| {
            let (from, to) = pair.split_once("=>")?;
            let from = from.trim();
            if from.is_empty() {
                return None;
            }
            Some(RewriteRule {
                from: from.to_string(),
                to: to.trim().to_string(),
            })
        })
        .collect()
}
