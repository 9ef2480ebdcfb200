//! Shared application state / 共享应用状态
//!
//! Read-only per process; request handlers hold it behind an Arc. All mutable
//! storage settings are re-resolved from the environment per request.
//! 进程内只读；处理器通过 Arc 持有。可变的存储配置每个请求重新解析。

use std::time::Duration;

use crate::config::AppConfig;

pub struct AppState {
    /// Startup configuration snapshot / 启动配置快照
    pub config: AppConfig,
    /// Shared HTTP client for upstream hops; redirects are never followed
    /// automatically so the proxy can extract Location itself
    /// 上游请求共享的HTTP客户端；从不自动跟随重定向，代理自行提取 Location
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        // 仅限制建立连接的时间；整体超时会中断合法的长时间流式下载，
        // 小响应的每跳超时由调用方按请求设置
        // Connect-scoped only; a whole-transfer timeout would abort legitimate
        // long streaming downloads. Per-hop timeouts for small responses are
        // set per request by the caller.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(config.gateway.proxy_timeout_secs))
            .build()?;

        Ok(Self { config, http })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_builds_with_defaults() {
        let state = AppState::new(AppConfig::default()).unwrap();
        assert_eq!(state.config.gateway.proxy_timeout_secs, 30);
    }
}
